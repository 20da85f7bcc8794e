use std::sync::Arc;

use actix_web::{Responder, get, post, web};
use common::env_config::Config;
use common::error::{AppError, Res};
use common::http::Success;
use common::jwt::JwtClaims;
use common::misc::Role;
use db::catalog::CatalogStore;
use db::sale::SaleStore;

use crate::dtos::sale::CreateSaleRequest;
use crate::services;

/// Settles the submitted cart into a completed sale owned by the caller.
///
/// # Input
/// - `req`: JSON payload with the cart lines in submission order
///
/// # Output
/// - Success: 200 with `{success: true, sale}`
/// - Error: 400 for an empty cart or a zero quantity, 404 for an unknown
///   catalog item
///
/// The caller clears its own cart after a successful settlement.
#[post("/create")]
pub async fn post_create(
    claims: web::ReqData<JwtClaims>,
    req: web::Json<CreateSaleRequest>,
    sales: web::Data<Arc<dyn SaleStore>>,
    catalog: web::Data<Arc<dyn CatalogStore>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let sale = services::sale::settle(
        &***sales,
        &***catalog,
        config.price_resolution,
        claims.user_id,
        req.into_inner().items,
    )
    .await?;
    Success::ok(serde_json::json!({ "success": true, "sale": sale }))
}

/// Lists the caller's sales, newest first.
#[get("/user")]
pub async fn get_user_sales(
    claims: web::ReqData<JwtClaims>,
    sales: web::Data<Arc<dyn SaleStore>>,
) -> Res<impl Responder> {
    let sales = sales.find_by_customer(claims.user_id).await?;
    Success::ok(sales)
}

/// Lists every sale, newest first. Admin only.
#[get("")]
pub async fn get_all_sales(
    claims: web::ReqData<JwtClaims>,
    sales: web::Data<Arc<dyn SaleStore>>,
) -> Res<impl Responder> {
    if claims.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Admin role required".to_string(),
        ));
    }
    let sales = sales.list_all().await?;
    Success::ok(sales)
}
