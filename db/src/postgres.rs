use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    error::{AppError, Res},
    misc::Role,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    catalog::CatalogStore,
    dtos::{sale::SaleDraft, user::UserDraft},
    models::{
        item::CatalogItem,
        sale::{Sale, SaleItem, SaleStatus},
        user::{PendingOtp, User},
    },
    sale::SaleStore,
    user::UserStore,
};

/// Postgres-backed store. The unique index on `users.email` is the
/// arbiter for duplicate signups; violations surface as `Conflict`.
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: Option<String>,
    google_id: Option<String>,
    role: String,
    verified: bool,
    otp_code: Option<String>,
    otp_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let otp = match (row.otp_code, row.otp_expires_at) {
            (Some(code), Some(expires_at)) => Some(PendingOtp { code, expires_at }),
            _ => None,
        };
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            google_id: row.google_id,
            role: Role::from_str(&row.role),
            verified: row.verified,
            otp,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SaleRow {
    id: Uuid,
    customer_id: Uuid,
    total: Decimal,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct SaleItemRow {
    product_name: String,
    quantity: i32,
    price: Decimal,
}

const USER_COLUMNS: &str =
    "id, email, password_hash, google_id, role, verified, otp_code, otp_expires_at, created_at";

fn map_unique_violation(err: sqlx::Error, detail: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(detail.to_string())
        }
        _ => AppError::from(err),
    }
}

impl PgStore {
    async fn load_items(&self, sale_id: Uuid) -> Res<Vec<SaleItem>> {
        let rows = sqlx::query_as::<_, SaleItemRow>(
            "SELECT product_name, quantity, price FROM sale_items WHERE sale_id = $1 ORDER BY position",
        )
        .bind(sale_id)
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| SaleItem {
                product_name: row.product_name,
                quantity: row.quantity as u32,
                price: row.price,
            })
            .collect())
    }

    async fn assemble_sale(&self, row: SaleRow) -> Res<Sale> {
        let items = self.load_items(row.id).await?;
        Ok(Sale {
            id: row.id,
            customer_id: row.customer_id,
            items,
            total: row.total,
            status: SaleStatus::from_str(&row.status),
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Res<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_google_id(&self, google_id: &str) -> Res<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE google_id = $1"
        ))
        .bind(google_id)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Res<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn create(&self, draft: UserDraft) -> Res<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, google_id, role, verified, otp_code, otp_expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&draft.email)
        .bind(&draft.password_hash)
        .bind(&draft.google_id)
        .bind(draft.role.as_str())
        .bind(draft.verified)
        .bind(draft.otp.as_ref().map(|o| o.code.clone()))
        .bind(draft.otp.as_ref().map(|o| o.expires_at))
        .bind(Utc::now())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, &format!("User with email {} already exists", draft.email))
        })?;
        Ok(User::from(row))
    }

    async fn save(&self, user: &User) -> Res<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, google_id, role, verified, otp_code, otp_expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                password_hash = EXCLUDED.password_hash,
                google_id = EXCLUDED.google_id,
                role = EXCLUDED.role,
                verified = EXCLUDED.verified,
                otp_code = EXCLUDED.otp_code,
                otp_expires_at = EXCLUDED.otp_expires_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.google_id)
        .bind(user.role.as_str())
        .bind(user.verified)
        .bind(user.otp.as_ref().map(|o| o.code.clone()))
        .bind(user.otp.as_ref().map(|o| o.expires_at))
        .bind(user.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, &format!("User with email {} already exists", user.email))
        })?;
        Ok(())
    }
}

#[async_trait]
impl SaleStore for PgStore {
    async fn insert(&self, draft: SaleDraft) -> Res<Sale> {
        let mut tx = self.pool.begin().await?;

        let sale_id = Uuid::new_v4();
        let created_at = Utc::now();
        sqlx::query(
            "INSERT INTO sales (id, customer_id, total, status, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(sale_id)
        .bind(draft.customer_id)
        .bind(draft.total)
        .bind(draft.status.as_str())
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in draft.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO sale_items (sale_id, position, product_name, quantity, price) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(sale_id)
            .bind(position as i32)
            .bind(&item.product_name)
            .bind(item.quantity as i32)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Sale {
            id: sale_id,
            customer_id: draft.customer_id,
            items: draft.items,
            total: draft.total,
            status: draft.status,
            created_at,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Res<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(
            "SELECT id, customer_id, total, status, created_at FROM sales WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.assemble_sale(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_customer(&self, customer_id: Uuid) -> Res<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(
            "SELECT id, customer_id, total, status, created_at FROM sales WHERE customer_id = $1 ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&*self.pool)
        .await?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            sales.push(self.assemble_sale(row).await?);
        }
        Ok(sales)
    }

    async fn list_all(&self) -> Res<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(
            "SELECT id, customer_id, total, status, created_at FROM sales ORDER BY created_at DESC",
        )
        .fetch_all(&*self.pool)
        .await?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            sales.push(self.assemble_sale(row).await?);
        }
        Ok(sales)
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn find_item(&self, id: Uuid) -> Res<Option<CatalogItem>> {
        let item = sqlx::query_as::<_, CatalogItemRow>(
            "SELECT id, name, price FROM catalog_items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(item.map(|row| CatalogItem {
            id: row.id,
            name: row.name,
            price: row.price,
        }))
    }
}

#[derive(sqlx::FromRow)]
struct CatalogItemRow {
    id: Uuid,
    name: String,
    price: Decimal,
}
