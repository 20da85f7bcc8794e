use actix_web::{HttpMessage, HttpResponse, dev::ServiceRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    env_config::JwtConfig,
    error::{AppError, Res},
    misc::Role,
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

pub struct ClaimsSpec {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Generates JWT token based on user object and JWT configuration options.
/// Tokens always carry an expiry claim; validation rejects tokens past it.
pub fn generate_jwt(spec: ClaimsSpec, config: &JwtConfig) -> Res<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.expiration_hours))
        .ok_or_else(|| AppError::Internal("JWT expiration timestamp overflow".to_string()))?
        .timestamp();

    let claims = JwtClaims {
        user_id: spec.user_id,
        email: spec.email,
        role: spec.role,
        exp: expiration as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(AppError::from)
}

/// Extracts claims object from JWT token.
/// Requires JWT secret.
pub fn validate_jwt(token: &str, secret: &str) -> Res<JwtClaims> {
    let token_data = jsonwebtoken::decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

pub fn get_jwt_claims_or_error(req: &ServiceRequest) -> Result<JwtClaims, HttpResponse> {
    if let Some(jwt_claims_res) = req.extensions().get::<Res<JwtClaims>>() {
        match jwt_claims_res {
            Ok(claims) => Ok(claims.clone()),
            Err(app_error) => Err(app_error.to_http_response()),
        }
    } else {
        Err(
            AppError::Unauthorized("No authorization token provided".to_string())
                .to_http_response(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 24,
        }
    }

    fn spec() -> ClaimsSpec {
        ClaimsSpec {
            user_id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            role: Role::Standard,
        }
    }

    #[test]
    fn round_trips_claims() {
        let config = test_config();
        let spec = spec();
        let user_id = spec.user_id;

        let token = generate_jwt(spec, &config).unwrap();
        let claims = validate_jwt(&token, &config.secret).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.role, Role::Standard);
        assert!(claims.exp > Utc::now().timestamp() as usize);
    }

    #[test]
    fn rejects_wrong_secret() {
        let config = test_config();
        let token = generate_jwt(spec(), &config).unwrap();

        assert!(validate_jwt(&token, "other-secret").is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let config = JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: -1,
        };
        let token = generate_jwt(spec(), &config).unwrap();

        assert!(validate_jwt(&token, &config.secret).is_err());
    }

    #[test]
    fn rejects_tampered_token() {
        let config = test_config();
        let mut token = generate_jwt(spec(), &config).unwrap();
        token.pop();
        token.push('A');

        assert!(validate_jwt(&token, &config.secret).is_err());
    }
}
