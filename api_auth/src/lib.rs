use actix_web::web::{self};

use middleware::auth::AuthMiddleware;

pub mod routes {
    pub mod auth;
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod otp;
    pub mod user;
}

pub mod middleware {
    pub mod auth;
}

pub mod dtos {
    pub mod auth;
}

pub fn mount_auth() -> actix_web::Scope {
    web::scope("/auth")
        .service(routes::auth::post_initiate_signup)
        .service(routes::auth::post_verify_otp)
        .service(routes::auth::post_login)
        .service(routes::auth::post_google)
}

pub fn mount_user() -> actix_web::Scope {
    web::scope("/user").service(routes::user::get_me)
}

/// Guard for bearer-only scopes; rejects requests whose extracted JWT
/// claims are missing or invalid.
pub fn auth_middleware() -> AuthMiddleware {
    AuthMiddleware::new()
}
