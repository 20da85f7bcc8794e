use actix_web::HttpResponse;
use thiserror::Error;

pub type Res<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    // === CONVERSION ERRORS ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JWT error: {0}")]
    JWT(#[from] jsonwebtoken::errors::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    // === APPLICATION ERRORS ===
    /// Concurrent write lost or duplicate unique key; retryable after re-reading state.
    #[error("Resource conflict: {0}")]
    Conflict(String),

    #[error("Invalid or expired OTP")]
    InvalidOrExpiredOtp,

    #[error("Email already exists")]
    AlreadyRegistered,

    #[error("Failed to send verification email")]
    DeliveryFailed(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Please verify your email first")]
    NotVerified,

    #[error("Invalid federated token: {0}")]
    InvalidFederatedToken(String),

    #[error("This email is linked to a different federated identity")]
    FederatedIdentityMismatch,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    #[error("Authorization error: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn to_http_response(&self) -> HttpResponse {
        let is_dev = cfg!(debug_assertions);

        let to_internal_json = |err_msg: &str| {
            if is_dev {
                serde_json::json!({ "error": err_msg })
            } else {
                serde_json::json!({ "error": "Internal server error" })
            }
        };

        let error_json = serde_json::json!({ "error": self.to_string() });

        match self {
            // === CONVERSION ERRORS ===
            AppError::Database(error) => {
                log::error!("Database error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::JWT(error) => {
                log::error!("JWT error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
            AppError::Reqwest(error) => {
                log::error!("Reqwest error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }

            // === APPLICATION ERRORS ===
            AppError::Conflict(_) => HttpResponse::Conflict().json(error_json),
            AppError::InvalidOrExpiredOtp
            | AppError::AlreadyRegistered
            | AppError::EmptyCart
            | AppError::InvalidQuantity(_)
            | AppError::BadRequest(_) => HttpResponse::BadRequest().json(error_json),
            AppError::DeliveryFailed(detail) => {
                log::error!("Email delivery failed: {}", detail);
                HttpResponse::BadGateway().json(error_json)
            }
            AppError::InvalidCredentials
            | AppError::NotVerified
            | AppError::InvalidFederatedToken(_)
            | AppError::FederatedIdentityMismatch
            | AppError::Unauthorized(_) => HttpResponse::Unauthorized().json(error_json),
            AppError::Forbidden(_) => HttpResponse::Forbidden().json(error_json),
            AppError::NotFound(_) => HttpResponse::NotFound().json(error_json),
            AppError::Internal(error) => {
                log::error!("Internal error: {}", error);
                HttpResponse::InternalServerError().json(to_internal_json(&error.to_string()))
            }
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        self.to_http_response()
    }
}
