use async_trait::async_trait;
use common::error::Res;
use uuid::Uuid;

use crate::models::item::CatalogItem;

/// Read-only view of the catalog; settlement resolves cart entries to
/// names and prices through this.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_item(&self, id: Uuid) -> Res<Option<CatalogItem>>;
}
