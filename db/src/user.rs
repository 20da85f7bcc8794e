use async_trait::async_trait;
use common::error::Res;
use uuid::Uuid;

use crate::{dtos::user::UserDraft, models::user::User};

/// User persistence operations.
///
/// Implementations enforce email uniqueness at creation: the losing side
/// of two concurrent `create` calls for one address gets
/// `AppError::Conflict`, which is retryable after re-reading state.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact-match lookup on the normalized (lowercased) email.
    async fn find_by_email(&self, email: &str) -> Res<Option<User>>;

    async fn find_by_google_id(&self, google_id: &str) -> Res<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Res<Option<User>>;

    /// Creates a user, assigning id and creation timestamp.
    async fn create(&self, draft: UserDraft) -> Res<User>;

    /// Upserts by id; last write wins. Email is immutable after creation.
    async fn save(&self, user: &User) -> Res<()>;
}
