use std::time::Duration;

use async_trait::async_trait;
use common::{
    env_config::SmtpConfig,
    error::{AppError, Res},
};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
};

/// Outbound delivery of one-time verification codes. The OTP engine
/// calls this before any account state is written, so a failed send
/// leaves the system untouched.
#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send_otp(&self, email: &str, code: &str) -> Res<()>;
}

/// SMTP-backed mailer with a bounded send timeout.
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, timeout: Duration) -> Res<Self> {
        let credentials =
            Credentials::new(config.username.clone(), config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Internal(format!("Failed to build SMTP transport: {}", e)))?
            .port(config.port)
            .credentials(credentials)
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl OtpMailer for SmtpMailer {
    async fn send_otp(&self, email: &str, code: &str) -> Res<()> {
        let from = self
            .from_address
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid SMTP from address: {}", e)))?;
        let to = email
            .parse()
            .map_err(|e| AppError::DeliveryFailed(format!("Invalid recipient address: {}", e)))?;

        let body = format!(
            "<h1>Welcome to Material &amp; Crafts!</h1>\
             <p>Your verification code is:</p>\
             <h2 style=\"font-size: 24px; padding: 10px; background-color: #f3f4f6; text-align: center;\">{}</h2>\
             <p>This code will expire in 10 minutes.</p>\
             <p>If you didn't request this code, please ignore this email.</p>",
            code
        );

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject("Your verification code for Material & Crafts")
            .header(ContentType::TEXT_HTML)
            .body(body)
            .map_err(|e| AppError::DeliveryFailed(format!("Failed to build message: {}", e)))?;

        self.mailer
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| AppError::DeliveryFailed(e.to_string()))
    }
}
