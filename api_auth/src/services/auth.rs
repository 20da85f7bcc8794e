use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use async_trait::async_trait;
use common::error::{AppError, Res};
use common::misc::Role;
use db::dtos::user::UserDraft;
use db::models::user::User;
use db::user::UserStore;

use crate::dtos::auth::LoginRequest;

use super::user::{is_valid_email, normalize_email};

/// Authenticates an existing user by password.
///
/// Unknown email, missing password credential and wrong password are all
/// `InvalidCredentials`; `verified` is checked only after the password
/// matches, so the error kind never reveals whether an email exists.
pub async fn authenticate_user(users: &dyn UserStore, login_data: &LoginRequest) -> Res<User> {
    let email = normalize_email(&login_data.email);
    let user = users
        .find_by_email(&email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let stored_hash = user
        .password_hash
        .as_deref()
        .ok_or(AppError::InvalidCredentials)?;
    let parsed_hash =
        PasswordHash::new(stored_hash).map_err(|_| AppError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(login_data.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::InvalidCredentials)?;

    if !user.verified {
        return Err(AppError::NotVerified);
    }
    Ok(user)
}

/// Identity recovered from a verified federated assertion.
#[derive(Debug, Clone)]
pub struct FederatedIdentity {
    pub subject: String,
    pub email: String,
}

/// External identity-provider verification seam; the production
/// implementation talks to Google, tests substitute a local stub.
#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Res<FederatedIdentity>;
}

/// Verifies Google ID tokens against the tokeninfo endpoint.
///
/// tokeninfo validates signature and expiry on Google's side; the
/// audience is checked here against the configured client id.
pub struct GoogleTokenVerifier {
    client: reqwest::Client,
    audience: String,
}

impl GoogleTokenVerifier {
    pub fn new(audience: String, timeout: Duration) -> Res<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AppError::from)?;
        Ok(Self { client, audience })
    }
}

#[async_trait]
impl IdTokenVerifier for GoogleTokenVerifier {
    async fn verify(&self, id_token: &str) -> Res<FederatedIdentity> {
        let response = self
            .client
            .get("https://oauth2.googleapis.com/tokeninfo")
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| {
                AppError::InvalidFederatedToken(format!("Verification request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::InvalidFederatedToken(format!(
                "Google returned status {}",
                response.status()
            )));
        }

        let payload: serde_json::Value = response.json().await.map_err(|e| {
            AppError::InvalidFederatedToken(format!("Failed to parse token payload: {}", e))
        })?;

        if payload["aud"].as_str() != Some(self.audience.as_str()) {
            return Err(AppError::InvalidFederatedToken(
                "Audience mismatch".to_string(),
            ));
        }

        let subject = payload["sub"].as_str().unwrap_or_default().to_string();
        let email = payload["email"].as_str().unwrap_or_default().to_string();
        if subject.is_empty() || email.is_empty() {
            return Err(AppError::InvalidFederatedToken(
                "Assertion carries no subject or email".to_string(),
            ));
        }

        Ok(FederatedIdentity { subject, email })
    }
}

/// Logs a user in from a federated assertion.
///
/// Provider proof substitutes for OTP verification: a fresh account is
/// created verified, and linking to an existing password account marks
/// it verified without touching the stored password hash. An account
/// already linked to a different subject is left untouched and the
/// login is refused.
pub async fn login_with_google(
    users: &dyn UserStore,
    verifier: &dyn IdTokenVerifier,
    credential: &str,
) -> Res<User> {
    let identity = verifier.verify(credential).await?;
    let email = normalize_email(&identity.email);
    if !is_valid_email(&email) {
        return Err(AppError::InvalidFederatedToken(
            "Assertion carries no usable email".to_string(),
        ));
    }

    match users.find_by_email(&email).await? {
        None => {
            users
                .create(UserDraft {
                    email,
                    password_hash: None,
                    google_id: Some(identity.subject),
                    role: Role::Standard,
                    verified: true,
                    otp: None,
                })
                .await
        }
        Some(mut user) => match user.google_id.as_deref() {
            None => {
                user.google_id = Some(identity.subject);
                user.verified = true;
                users.save(&user).await?;
                Ok(user)
            }
            Some(linked) if linked == identity.subject => Ok(user),
            Some(_) => Err(AppError::FederatedIdentityMismatch),
        },
    }
}

#[cfg(test)]
mod tests {
    use db::memory::MemoryStore;
    use mailer::OtpMailer;

    use super::*;
    use crate::services::otp;

    struct StubVerifier {
        subject: &'static str,
        email: &'static str,
    }

    #[async_trait]
    impl IdTokenVerifier for StubVerifier {
        async fn verify(&self, id_token: &str) -> Res<FederatedIdentity> {
            if id_token != "valid-token" {
                return Err(AppError::InvalidFederatedToken(
                    "Signature invalid".to_string(),
                ));
            }
            Ok(FederatedIdentity {
                subject: self.subject.to_string(),
                email: self.email.to_string(),
            })
        }
    }

    struct NullMailer;

    #[async_trait]
    impl OtpMailer for NullMailer {
        async fn send_otp(&self, _email: &str, _code: &str) -> Res<()> {
            Ok(())
        }
    }

    const EMAIL: &str = "customer@example.com";
    const PASSWORD: &str = "hunter22";

    async fn verified_password_user(store: &MemoryStore) -> User {
        struct Recorder(std::sync::Mutex<String>);

        #[async_trait]
        impl OtpMailer for Recorder {
            async fn send_otp(&self, _email: &str, code: &str) -> Res<()> {
                *self.0.lock().unwrap() = code.to_string();
                Ok(())
            }
        }

        let recorder = Recorder(std::sync::Mutex::new(String::new()));
        otp::initiate_signup(store, &recorder, EMAIL, PASSWORD, 10)
            .await
            .unwrap();
        let code = recorder.0.lock().unwrap().clone();
        otp::verify_otp(store, EMAIL, &code).await.unwrap()
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn correct_password_authenticates() {
        let store = MemoryStore::new();
        let created = verified_password_user(&store).await;

        let user = authenticate_user(&store, &login(EMAIL, PASSWORD)).await.unwrap();
        assert_eq!(user.id, created.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let store = MemoryStore::new();
        verified_password_user(&store).await;

        let wrong = authenticate_user(&store, &login(EMAIL, "wrong-pass"))
            .await
            .unwrap_err();
        let unknown = authenticate_user(&store, &login("ghost@example.com", PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unverified_user_with_correct_password_is_rejected() {
        let store = MemoryStore::new();
        otp::initiate_signup(&store, &NullMailer, EMAIL, PASSWORD, 10)
            .await
            .unwrap();

        let err = authenticate_user(&store, &login(EMAIL, PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotVerified));
    }

    #[tokio::test]
    async fn google_login_creates_verified_user() {
        let store = MemoryStore::new();
        let verifier = StubVerifier {
            subject: "goog-123",
            email: EMAIL,
        };

        let user = login_with_google(&store, &verifier, "valid-token")
            .await
            .unwrap();
        assert!(user.verified);
        assert_eq!(user.google_id.as_deref(), Some("goog-123"));
        assert!(user.password_hash.is_none());

        // a repeat login resolves to the same account
        let again = login_with_google(&store, &verifier, "valid-token")
            .await
            .unwrap();
        assert_eq!(again.id, user.id);
    }

    #[tokio::test]
    async fn google_login_links_existing_password_account() {
        let store = MemoryStore::new();
        let created = verified_password_user(&store).await;
        let verifier = StubVerifier {
            subject: "goog-123",
            email: EMAIL,
        };

        let user = login_with_google(&store, &verifier, "valid-token")
            .await
            .unwrap();
        assert_eq!(user.id, created.id);
        assert_eq!(user.google_id.as_deref(), Some("goog-123"));

        // the password credential survives the link
        authenticate_user(&store, &login(EMAIL, PASSWORD)).await.unwrap();
    }

    #[tokio::test]
    async fn conflicting_subject_is_rejected_and_preserved() {
        let store = MemoryStore::new();
        let first = StubVerifier {
            subject: "goog-123",
            email: EMAIL,
        };
        login_with_google(&store, &first, "valid-token").await.unwrap();

        let second = StubVerifier {
            subject: "goog-456",
            email: EMAIL,
        };
        let err = login_with_google(&store, &second, "valid-token")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FederatedIdentityMismatch));

        let user = store.find_by_email(EMAIL).await.unwrap().unwrap();
        assert_eq!(user.google_id.as_deref(), Some("goog-123"));
    }

    #[tokio::test]
    async fn invalid_assertion_is_rejected() {
        let store = MemoryStore::new();
        let verifier = StubVerifier {
            subject: "goog-123",
            email: EMAIL,
        };

        let err = login_with_google(&store, &verifier, "forged-token")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFederatedToken(_)));
        assert!(store.find_by_email(EMAIL).await.unwrap().is_none());
    }
}
