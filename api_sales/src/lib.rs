use actix_web::web::{self};

pub mod routes {
    pub mod sale;
}

pub mod services {
    pub mod sale;
}

pub mod dtos {
    pub mod sale;
}

pub fn mount_sales() -> actix_web::Scope {
    web::scope("/sales")
        .service(routes::sale::post_create)
        .service(routes::sale::get_user_sales)
        .service(routes::sale::get_all_sales)
}
