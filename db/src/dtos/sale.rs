use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::sale::{SaleItem, SaleStatus};

/// A fully priced order ready to persist; the store assigns id and
/// creation timestamp.
#[derive(Debug, Clone)]
pub struct SaleDraft {
    pub customer_id: Uuid,
    pub items: Vec<SaleItem>,
    pub total: Decimal,
    pub status: SaleStatus,
}
