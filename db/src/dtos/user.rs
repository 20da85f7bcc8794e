use common::misc::Role;

use crate::models::user::PendingOtp;

/// Everything needed to create a user; the store assigns id and
/// creation timestamp. Email must already be normalized by the caller.
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub email: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub role: Role,
    pub verified: bool,
    pub otp: Option<PendingOtp>,
}
