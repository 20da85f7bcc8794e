use chrono::{DateTime, Utc};
use common::misc::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One-time verification code attached to an unverified account.
/// Present only while email verification is outstanding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOtp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Lowercased before any lookup or insert; unique across users.
    pub email: String,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub role: Role,
    pub verified: bool,
    #[serde(skip)]
    pub otp: Option<PendingOtp>,
    pub created_at: DateTime<Utc>,
}
