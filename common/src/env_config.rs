use std::{env, sync::Arc};

use crate::misc::PriceResolution;

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// This struct holds all the necessary configuration parameters
/// required to initialize and run the server: database connection
/// details, JWT configuration, server host and port, number of worker
/// threads, CORS settings, logging preferences, SMTP delivery settings,
/// the Google client used for federated login, and order pricing policy.
pub struct Config {
    // environment
    pub environment: String, // development or production
    /// The URL of the database to connect to.
    /// When unset, the server runs against the in-memory store.
    pub database_url: Option<String>,
    /// Configuration for JWT (JSON Web Token) authentication.
    pub jwt_config: JwtConfig,
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
    /// The Google OAuth client id; used as the expected audience when
    /// verifying Google ID tokens.
    pub google_client_id: String,
    /// SMTP settings for outbound verification email.
    pub smtp: SmtpConfig,
    /// Minutes before a pending verification code expires.
    pub otp_ttl_minutes: i64,
    /// Whether order prices are re-resolved from the catalog (default)
    /// or trusted as submitted by the client.
    pub price_resolution: PriceResolution,
    /// Timeout in seconds for calls to external collaborators
    /// (email delivery, token verification).
    pub collaborator_timeout_secs: u64,
    /// Optional admin account bootstrapped at startup.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Clone, Debug)]
/// SMTP settings for the verification mailer.
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Clone, Debug)]
/// Configuration for JSON Web Token (JWT) authentication.
///
/// This struct contains the secret key used to sign JWTs and
/// the expiration time in hours for issued tokens.
pub struct JwtConfig {
    /// The secret key used to sign and verify JWTs.
    pub secret: String,
    /// The expiration time for JWTs in hours.
    pub expiration_hours: i64,
}

impl JwtConfig {
    /// Creates a new `JwtConfig` instance from environment variables.
    ///
    /// Reads the JWT configuration from environment variables:
    /// - `JWT_SECRET`: Required. The secret key for JWT signing.
    /// - `JWT_EXPIRATION_HOURS`: Optional. Defaults to 24 hours if not provided.
    ///
    /// # Panics
    ///
    /// This function will panic if:
    /// - `JWT_SECRET` environment variable is not set
    /// - `JWT_EXPIRATION_HOURS` is set but cannot be parsed as a valid number
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        JwtConfig {
            secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("JWT_EXPIRATION_HOURS must be a valid number"),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// # Environment Variables
    ///
    /// Required:
    /// - `ENVIRONMENT`: development or production
    /// - `JWT_SECRET`: Secret key for JWT signing (via `JwtConfig::from_env()`)
    ///
    /// Optional (with defaults):
    /// - `DATABASE_URL`: Postgres connection string; in-memory store when unset
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8080)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "http://localhost:3000")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `GOOGLE_CLIENT_ID`: Expected audience of Google ID tokens
    /// - `SMTP_HOST`/`SMTP_PORT`/`SMTP_USER`/`SMTP_PASS`/`SMTP_FROM`: mailer settings
    /// - `OTP_TTL_MINUTES`: Verification code lifetime (default: 10)
    /// - `PRICE_RESOLUTION`: "catalog" (default) or "trusted"
    /// - `COLLABORATOR_TIMEOUT_SECS`: External call timeout (default: 10)
    /// - `ADMIN_EMAIL`/`ADMIN_PASSWORD`: admin account seeded at startup
    ///
    /// # Panics
    ///
    /// This function will panic if required environment variables are missing
    /// or if numeric values cannot be parsed correctly.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        Arc::new(Config {
            environment: env::var("ENVIRONMENT").expect("ENVIRONMENT must be set"),
            database_url: env::var("DATABASE_URL").ok(),
            jwt_config: JwtConfig::from_env(),
            server_host: env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            num_workers: env::var("WORKERS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            console_logging_enabled: env::var("ENABLE_CONSOLE_LOGGING")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                == "true",
            google_client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            smtp: SmtpConfig {
                host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
                port: env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse()
                    .unwrap_or(587),
                username: env::var("SMTP_USER").unwrap_or_default(),
                password: env::var("SMTP_PASS").unwrap_or_default(),
                from_address: env::var("SMTP_FROM")
                    .or_else(|_| env::var("SMTP_USER"))
                    .unwrap_or_default(),
            },
            otp_ttl_minutes: env::var("OTP_TTL_MINUTES")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("OTP_TTL_MINUTES must be a valid number"),
            price_resolution: match env::var("PRICE_RESOLUTION")
                .unwrap_or_else(|_| "catalog".to_string())
                .to_lowercase()
                .as_str()
            {
                "trusted" => PriceResolution::Trusted,
                _ => PriceResolution::Catalog,
            },
            collaborator_timeout_secs: env::var("COLLABORATOR_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        })
    }
}
