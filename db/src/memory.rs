use async_trait::async_trait;
use chrono::Utc;
use common::error::{AppError, Res};
use dashmap::{DashMap, mapref::entry::Entry};
use uuid::Uuid;

use crate::{
    catalog::CatalogStore,
    dtos::{sale::SaleDraft, user::UserDraft},
    models::{item::CatalogItem, sale::Sale, user::User},
    sale::SaleStore,
    user::UserStore,
};

/// In-memory store backing tests and the no-database development mode.
///
/// Email uniqueness is arbitrated through the `emails` index: a claim is
/// taken atomically via the entry API before the user record is written,
/// so two concurrent creates for one address resolve first-writer-wins
/// and the loser sees `Conflict`.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    emails: DashMap<String, Uuid>,
    sales: DashMap<Uuid, Sale>,
    items: DashMap<Uuid, CatalogItem>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a catalog entry; used by tests and development fixtures.
    pub fn add_catalog_item(&self, item: CatalogItem) {
        self.items.insert(item.id, item);
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Res<Option<User>> {
        let id = match self.emails.get(email) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_google_id(&self, google_id: &str) -> Res<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.google_id.as_deref() == Some(google_id))
            .map(|u| u.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Res<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn create(&self, draft: UserDraft) -> Res<User> {
        let id = Uuid::new_v4();
        match self.emails.entry(draft.email.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict(format!(
                    "User with email {} already exists",
                    draft.email
                )));
            }
            Entry::Vacant(entry) => {
                entry.insert(id);
            }
        }

        let user = User {
            id,
            email: draft.email,
            password_hash: draft.password_hash,
            google_id: draft.google_id,
            role: draft.role,
            verified: draft.verified,
            otp: draft.otp,
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> Res<()> {
        self.users.insert(user.id, user.clone());
        self.emails.insert(user.email.clone(), user.id);
        Ok(())
    }
}

#[async_trait]
impl SaleStore for MemoryStore {
    async fn insert(&self, draft: SaleDraft) -> Res<Sale> {
        let sale = Sale {
            id: Uuid::new_v4(),
            customer_id: draft.customer_id,
            items: draft.items,
            total: draft.total,
            status: draft.status,
            created_at: Utc::now(),
        };
        self.sales.insert(sale.id, sale.clone());
        Ok(sale)
    }

    async fn find_by_id(&self, id: Uuid) -> Res<Option<Sale>> {
        Ok(self.sales.get(&id).map(|s| s.value().clone()))
    }

    async fn find_by_customer(&self, customer_id: Uuid) -> Res<Vec<Sale>> {
        let mut sales: Vec<Sale> = self
            .sales
            .iter()
            .filter(|s| s.customer_id == customer_id)
            .map(|s| s.value().clone())
            .collect();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sales)
    }

    async fn list_all(&self) -> Res<Vec<Sale>> {
        let mut sales: Vec<Sale> = self.sales.iter().map(|s| s.value().clone()).collect();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sales)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_item(&self, id: Uuid) -> Res<Option<CatalogItem>> {
        Ok(self.items.get(&id).map(|i| i.value().clone()))
    }
}
