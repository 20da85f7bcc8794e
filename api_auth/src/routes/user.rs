use std::sync::Arc;

use actix_web::{Responder, get, web};
use common::{error::Res, http::Success, jwt::JwtClaims};
use db::user::UserStore;

use crate::services;

/// Returns the current authenticated user's profile. Secrets
/// (password hash, pending code) never serialize.
#[get("/me")]
pub async fn get_me(
    claims: web::ReqData<JwtClaims>,
    users: web::Data<Arc<dyn UserStore>>,
) -> Res<impl Responder> {
    let user = services::user::get_user_by_id(&***users, claims.user_id).await?;
    Success::ok(user)
}
