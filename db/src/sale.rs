use async_trait::async_trait;
use common::error::Res;
use uuid::Uuid;

use crate::{dtos::sale::SaleDraft, models::sale::Sale};

/// Sale persistence operations. Sales are write-once; there is no
/// update path.
#[async_trait]
pub trait SaleStore: Send + Sync {
    async fn insert(&self, draft: SaleDraft) -> Res<Sale>;

    async fn find_by_id(&self, id: Uuid) -> Res<Option<Sale>>;

    /// All sales placed by one customer, newest first.
    async fn find_by_customer(&self, customer_id: Uuid) -> Res<Vec<Sale>>;

    /// All sales, newest first.
    async fn list_all(&self) -> Res<Vec<Sale>>;
}
