use chrono::{Duration, Utc};
use common::error::{AppError, Res};
use common::misc::Role;
use db::dtos::user::UserDraft;
use db::models::user::{PendingOtp, User};
use db::user::UserStore;
use mailer::OtpMailer;
use rand::Rng;

use super::user::{hash_password, is_valid_email, normalize_email};

/// Generates a 6-digit code drawn uniformly from 000000-999999.
fn generate_otp() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// Starts (or restarts) signup for an email address.
///
/// The code is handed to the mailer before any account state is written;
/// a failed or timed-out delivery leaves the store untouched. A repeat
/// call for a still-unverified address overwrites the password hash and
/// the pending code, so only the latest signup attempt can verify.
pub async fn initiate_signup(
    users: &dyn UserStore,
    otp_mailer: &dyn OtpMailer,
    email: &str,
    password: &str,
    ttl_minutes: i64,
) -> Res<String> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if password.len() < 6 {
        return Err(AppError::BadRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let existing = users.find_by_email(&email).await?;
    if existing.as_ref().is_some_and(|user| user.verified) {
        return Err(AppError::AlreadyRegistered);
    }

    let code = generate_otp();
    otp_mailer.send_otp(&email, &code).await?;

    let password_hash = hash_password(password)?;
    let otp = PendingOtp {
        code,
        expires_at: Utc::now() + Duration::minutes(ttl_minutes),
    };

    match existing {
        Some(mut user) => {
            user.password_hash = Some(password_hash);
            user.otp = Some(otp);
            users.save(&user).await?;
        }
        None => {
            users
                .create(UserDraft {
                    email: email.clone(),
                    password_hash: Some(password_hash),
                    google_id: None,
                    role: Role::Standard,
                    verified: false,
                    otp: Some(otp),
                })
                .await?;
        }
    }

    Ok(email)
}

/// Redeems a pending verification code.
///
/// Codes are single-use: success flips `verified` and clears the code.
/// Unknown email, wrong code, missing code and expired code are all the
/// same failure, and nothing is mutated on that path.
pub async fn verify_otp(users: &dyn UserStore, email: &str, submitted_code: &str) -> Res<User> {
    let email = normalize_email(email);
    let mut user = users
        .find_by_email(&email)
        .await?
        .ok_or(AppError::InvalidOrExpiredOtp)?;

    let matches = user
        .otp
        .as_ref()
        .is_some_and(|otp| otp.code == submitted_code && Utc::now() < otp.expires_at);
    if !matches {
        return Err(AppError::InvalidOrExpiredOtp);
    }

    user.verified = true;
    user.otp = None;
    users.save(&user).await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use db::memory::MemoryStore;

    use super::*;

    /// Mailer double; records delivered codes and can be told to fail.
    struct StubMailer {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl StubMailer {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn last_code(&self) -> String {
            self.sent.lock().unwrap().last().unwrap().1.clone()
        }
    }

    #[async_trait]
    impl OtpMailer for StubMailer {
        async fn send_otp(&self, email: &str, code: &str) -> Res<()> {
            if self.fail {
                return Err(AppError::DeliveryFailed("SMTP unreachable".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((email.to_string(), code.to_string()));
            Ok(())
        }
    }

    const EMAIL: &str = "customer@example.com";
    const PASSWORD: &str = "hunter22";

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..32 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn wrong_code_fails_and_leaves_unverified() {
        let store = MemoryStore::new();
        let mail = StubMailer::new();

        initiate_signup(&store, &mail, EMAIL, PASSWORD, 10)
            .await
            .unwrap();
        let right_code = mail.last_code();
        let wrong_code = if right_code == "000000" { "000001" } else { "000000" };

        let err = verify_otp(&store, EMAIL, wrong_code).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidOrExpiredOtp));

        let user = store.find_by_email(EMAIL).await.unwrap().unwrap();
        assert!(!user.verified);
        assert!(user.otp.is_some());
    }

    #[tokio::test]
    async fn right_code_verifies_and_is_single_use() {
        let store = MemoryStore::new();
        let mail = StubMailer::new();

        initiate_signup(&store, &mail, EMAIL, PASSWORD, 10)
            .await
            .unwrap();
        let code = mail.last_code();

        let user = verify_otp(&store, EMAIL, &code).await.unwrap();
        assert!(user.verified);
        assert!(user.otp.is_none());

        // the code cannot be redeemed twice
        let err = verify_otp(&store, EMAIL, &code).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidOrExpiredOtp));
    }

    #[tokio::test]
    async fn expired_code_fails() {
        let store = MemoryStore::new();
        let mail = StubMailer::new();

        initiate_signup(&store, &mail, EMAIL, PASSWORD, 0)
            .await
            .unwrap();
        let code = mail.last_code();

        let err = verify_otp(&store, EMAIL, &code).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidOrExpiredOtp));
    }

    #[tokio::test]
    async fn newer_signup_invalidates_earlier_code() {
        let store = MemoryStore::new();
        let mail = StubMailer::new();

        initiate_signup(&store, &mail, EMAIL, PASSWORD, 10)
            .await
            .unwrap();
        let first_code = mail.last_code();

        initiate_signup(&store, &mail, EMAIL, "new-password", 10)
            .await
            .unwrap();
        let second_code = mail.last_code();

        if first_code != second_code {
            let err = verify_otp(&store, EMAIL, &first_code).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidOrExpiredOtp));
        }
        let user = verify_otp(&store, EMAIL, &second_code).await.unwrap();
        assert!(user.verified);
    }

    #[tokio::test]
    async fn verified_email_cannot_restart_signup() {
        let store = MemoryStore::new();
        let mail = StubMailer::new();

        initiate_signup(&store, &mail, EMAIL, PASSWORD, 10)
            .await
            .unwrap();
        verify_otp(&store, EMAIL, &mail.last_code()).await.unwrap();

        let err = initiate_signup(&store, &mail, EMAIL, PASSWORD, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyRegistered));
    }

    #[tokio::test]
    async fn failed_delivery_creates_no_state() {
        let store = MemoryStore::new();
        let mail = StubMailer::failing();

        let err = initiate_signup(&store, &mail, EMAIL, PASSWORD, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DeliveryFailed(_)));
        assert!(store.find_by_email(EMAIL).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_delivery_keeps_previous_attempt_intact() {
        let store = MemoryStore::new();
        let good_mail = StubMailer::new();
        let bad_mail = StubMailer::failing();

        initiate_signup(&store, &good_mail, EMAIL, PASSWORD, 10)
            .await
            .unwrap();
        let code = good_mail.last_code();

        let err = initiate_signup(&store, &bad_mail, EMAIL, "other-pass", 10)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DeliveryFailed(_)));

        // the earlier attempt still verifies
        let user = verify_otp(&store, EMAIL, &code).await.unwrap();
        assert!(user.verified);
    }

    #[tokio::test]
    async fn email_lookup_is_case_insensitive() {
        let store = MemoryStore::new();
        let mail = StubMailer::new();

        initiate_signup(&store, &mail, "Customer@Example.COM", PASSWORD, 10)
            .await
            .unwrap();
        let code = mail.last_code();

        let user = verify_otp(&store, "customer@example.com", &code).await.unwrap();
        assert_eq!(user.email, "customer@example.com");
    }

    #[tokio::test]
    async fn rejects_malformed_email_and_short_password() {
        let store = MemoryStore::new();
        let mail = StubMailer::new();

        assert!(matches!(
            initiate_signup(&store, &mail, "not-an-email", PASSWORD, 10)
                .await
                .unwrap_err(),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            initiate_signup(&store, &mail, EMAIL, "short", 10)
                .await
                .unwrap_err(),
            AppError::BadRequest(_)
        ));
        assert!(store.find_by_email(EMAIL).await.unwrap().is_none());
    }
}
