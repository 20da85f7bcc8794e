use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One cart line as submitted by the client.
///
/// Under catalog pricing only the ids and quantity matter; the name and
/// price fields exist for the legacy trusted mode and are otherwise
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartEntry {
    #[serde(default)]
    pub material_id: Option<Uuid>,
    #[serde(default)]
    pub design_id: Option<Uuid>,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub add_on_price: Option<Decimal>,
    pub quantity: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSaleRequest {
    pub items: Vec<CartEntry>,
}
