use common::error::{AppError, Res};
use common::misc::PriceResolution;
use db::catalog::CatalogStore;
use db::dtos::sale::SaleDraft;
use db::models::sale::{Sale, SaleItem, SaleStatus};
use db::sale::SaleStore;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dtos::sale::CartEntry;

/// Converts a cart snapshot into a persisted, completed sale.
///
/// Totals are always computed server-side. Under `Catalog` pricing every
/// entry is re-resolved against the catalog and client price fields are
/// ignored; `Trusted` accepts submitted prices and exists only for
/// legacy-client compatibility. Validation failures persist nothing.
pub async fn settle(
    sales: &dyn SaleStore,
    catalog: &dyn CatalogStore,
    mode: PriceResolution,
    customer_id: Uuid,
    cart: Vec<CartEntry>,
) -> Res<Sale> {
    if cart.is_empty() {
        return Err(AppError::EmptyCart);
    }
    if let Some(entry) = cart.iter().find(|entry| entry.quantity < 1) {
        return Err(AppError::InvalidQuantity(entry.quantity));
    }

    let mut items = Vec::with_capacity(cart.len());
    let mut total = Decimal::ZERO;
    for entry in &cart {
        let (product_name, price) = match mode {
            PriceResolution::Catalog => resolve_prices(catalog, entry).await?,
            PriceResolution::Trusted => submitted_prices(entry)?,
        };
        total += price * Decimal::from(entry.quantity);
        items.push(SaleItem {
            product_name,
            quantity: entry.quantity,
            price,
        });
    }

    sales
        .insert(SaleDraft {
            customer_id,
            items,
            total,
            status: SaleStatus::Completed,
        })
        .await
}

/// Effective unit price from the catalog: material price plus the
/// add-on design price when a design is attached.
async fn resolve_prices(catalog: &dyn CatalogStore, entry: &CartEntry) -> Res<(String, Decimal)> {
    let material_id = entry
        .material_id
        .ok_or_else(|| AppError::BadRequest("Cart entry is missing its catalog id".to_string()))?;
    let material = catalog
        .find_item(material_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Catalog item {} does not exist", material_id)))?;

    let mut price = material.price;
    if let Some(design_id) = entry.design_id {
        let design = catalog
            .find_item(design_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Catalog item {} does not exist", design_id)))?;
        price += design.price;
    }

    Ok((material.name, price))
}

fn submitted_prices(entry: &CartEntry) -> Res<(String, Decimal)> {
    if entry.product_name.is_empty() {
        return Err(AppError::BadRequest(
            "Cart entry is missing a product name".to_string(),
        ));
    }
    let unit_price = entry
        .unit_price
        .ok_or_else(|| AppError::BadRequest("Cart entry is missing a price".to_string()))?;
    let add_on = entry.add_on_price.unwrap_or(Decimal::ZERO);
    if unit_price < Decimal::ZERO || add_on < Decimal::ZERO {
        return Err(AppError::BadRequest(
            "Prices must be non-negative".to_string(),
        ));
    }
    Ok((entry.product_name.clone(), unit_price + add_on))
}
