use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single settled line; `price` is the effective unit price
/// (base plus add-on) at settlement time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_name: String,
    pub quantity: u32,
    pub price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Pending,
    Completed,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "pending" => SaleStatus::Pending,
            "cancelled" => SaleStatus::Cancelled,
            _ => SaleStatus::Completed,
        }
    }
}

/// An immutable, settled order. Items keep submission order;
/// `total` is computed server-side and never taken from a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub items: Vec<SaleItem>,
    pub total: Decimal,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
}
