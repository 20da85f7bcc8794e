use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, password_hash::PasswordHasher};
use common::env_config::Config;
use common::error::{AppError, Res};
use common::misc::Role;
use db::dtos::user::UserDraft;
use db::user::UserStore;
use uuid::Uuid;

use db::models::user::User;

/// Emails are compared and stored in this form only.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && !tld.is_empty(),
        None => false,
    }
}

pub fn hash_password(password: &str) -> Res<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

pub async fn get_user_by_id(users: &dyn UserStore, user_id: Uuid) -> Res<User> {
    users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} does not exist", user_id)))
}

/// Seeds the admin account configured through `ADMIN_EMAIL`/`ADMIN_PASSWORD`.
/// A concurrent boot racing the same insert is fine; the loser's conflict
/// means the account already exists.
pub async fn ensure_admin(users: &dyn UserStore, config: &Config) -> Res<()> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };

    let email = normalize_email(email);
    if users.find_by_email(&email).await?.is_some() {
        return Ok(());
    }

    let draft = UserDraft {
        email: email.clone(),
        password_hash: Some(hash_password(password)?),
        google_id: None,
        role: Role::Admin,
        verified: true,
        otp: None,
    };

    match users.create(draft).await {
        Ok(_) => {
            log::info!("Admin user {} created", email);
            Ok(())
        }
        Err(AppError::Conflict(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use db::memory::MemoryStore;

    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  User@Example.COM "), "user@example.com");
    }

    #[test]
    fn validates_email_shape() {
        assert!(is_valid_email("test@example.com"));
        assert!(is_valid_email("user.name@domain.co.uk"));
        assert!(is_valid_email("a@b.c"));

        assert!(!is_valid_email(""));
        assert!(!is_valid_email("@"));
        assert!(!is_valid_email("test@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("test@domain"));
        assert!(!is_valid_email("test"));
    }

    #[tokio::test]
    async fn ensure_admin_seeds_verified_admin_once() {
        let store = MemoryStore::new();
        let config = config_with_admin();

        ensure_admin(&store, &config).await.unwrap();
        let admin = store
            .find_by_email("admin@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.verified);
        assert!(admin.password_hash.is_some());

        // second boot is a no-op
        ensure_admin(&store, &config).await.unwrap();
    }

    fn config_with_admin() -> Config {
        use common::env_config::{JwtConfig, SmtpConfig};
        use common::misc::PriceResolution;

        Config {
            environment: "development".to_string(),
            database_url: None,
            jwt_config: JwtConfig {
                secret: "secret".to_string(),
                expiration_hours: 24,
            },
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            num_workers: 1,
            cors_allowed_origin: "http://localhost:3000".to_string(),
            console_logging_enabled: false,
            google_client_id: String::new(),
            smtp: SmtpConfig {
                host: "localhost".to_string(),
                port: 587,
                username: String::new(),
                password: String::new(),
                from_address: String::new(),
            },
            otp_ttl_minutes: 10,
            price_resolution: PriceResolution::Catalog,
            collaborator_timeout_secs: 10,
            admin_email: Some("admin@example.com".to_string()),
            admin_password: Some("admin123".to_string()),
        }
    }
}
