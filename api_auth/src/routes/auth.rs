use actix_web::{Responder, post, web};
use common::env_config::Config;
use common::error::Res;
use common::http::Success;
use common::jwt::{self, ClaimsSpec};
use db::models::user::User;
use db::user::UserStore;
use mailer::OtpMailer;
use std::sync::Arc;

use crate::dtos::auth::{
    AuthResponse, GoogleLoginRequest, InitiateSignupRequest, InitiateSignupResponse, LoginRequest,
    VerifyOtpRequest,
};
use crate::services::{self, auth::IdTokenVerifier};

fn auth_response(user: &User, config: &Config) -> Res<AuthResponse> {
    let token = jwt::generate_jwt(
        ClaimsSpec {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        },
        &config.jwt_config,
    )?;
    Ok(AuthResponse {
        token,
        role: user.role,
    })
}

/// Starts signup: generates a verification code, emails it, then creates
/// or refreshes the unverified account.
///
/// # Input
/// - `req`: JSON payload with email and password
///
/// # Output
/// - Success: 200 with a confirmation message and the normalized email
/// - Error: 400 if the email is already registered, 502 if delivery failed
///
/// # Frontend Example
/// ```javascript
/// // Using fetch API
/// const response = await fetch('/api/auth/initiate-signup', {
///   method: 'POST',
///   headers: {
///     'Content-Type': 'application/json'
///   },
///   body: JSON.stringify({
///     email: 'user@example.com',
///     password: 'securepassword'
///   })
/// });
///
/// if (response.ok) {
///   const data = await response.json();
///   // Show the "check your inbox" screen for data.email
/// }
/// ```
#[post("/initiate-signup")]
pub async fn post_initiate_signup(
    req: web::Json<InitiateSignupRequest>,
    users: web::Data<Arc<dyn UserStore>>,
    otp_mailer: web::Data<Arc<dyn OtpMailer>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let req = req.into_inner();
    let email = services::otp::initiate_signup(
        &***users,
        &***otp_mailer,
        &req.email,
        &req.password,
        config.otp_ttl_minutes,
    )
    .await?;
    Success::ok(InitiateSignupResponse {
        message: "OTP sent to your email".to_string(),
        email,
    })
}

/// Redeems a verification code and issues the first session token.
///
/// # Input
/// - `req`: JSON payload with email and the 6-digit code
///
/// # Output
/// - Success: 200 with `{token, role}`
/// - Error: 400 when the code is wrong, expired or superseded
#[post("/verify-otp")]
pub async fn post_verify_otp(
    req: web::Json<VerifyOtpRequest>,
    users: web::Data<Arc<dyn UserStore>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let req = req.into_inner();
    let user = services::otp::verify_otp(&***users, &req.email, &req.otp).await?;
    Success::ok(auth_response(&user, &config)?)
}

/// Authenticates a user with email and password.
///
/// # Input
/// - `login_data`: JSON payload containing email and password
///
/// # Output
/// - Success: 200 with `{token, role}`
/// - Error: 401 for invalid credentials or an unverified account
///
/// # Frontend Example
/// ```javascript
/// // Using fetch API
/// const response = await fetch('/api/auth/login', {
///   method: 'POST',
///   headers: {
///     'Content-Type': 'application/json'
///   },
///   body: JSON.stringify({
///     email: 'user@example.com',
///     password: 'securepassword'
///   })
/// });
///
/// if (response.ok) {
///   const authData = await response.json();
///   // Store token for authenticated requests
///   localStorage.setItem('authToken', authData.token);
/// }
/// ```
#[post("/login")]
pub async fn post_login(
    login_data: web::Json<LoginRequest>,
    users: web::Data<Arc<dyn UserStore>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let user = services::auth::authenticate_user(&***users, &login_data.into_inner()).await?;
    Success::ok(auth_response(&user, &config)?)
}

/// Authenticates with a Google ID token, creating or linking the account.
///
/// # Input
/// - `req`: JSON payload with the `credential` issued by Google sign-in
///
/// # Output
/// - Success: 200 with `{token, role}`
/// - Error: 401 when the assertion is invalid or the email is linked to a
///   different federated identity
#[post("/google")]
pub async fn post_google(
    req: web::Json<GoogleLoginRequest>,
    users: web::Data<Arc<dyn UserStore>>,
    verifier: web::Data<Arc<dyn IdTokenVerifier>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let user =
        services::auth::login_with_google(&***users, &***verifier, &req.into_inner().credential)
            .await?;
    Success::ok(auth_response(&user, &config)?)
}
