use std::sync::Arc;

use actix_web::{
    Responder, get,
    web::{self},
};
use common::{env_config::Config, error::Res, http::Success, jwt::JwtClaims};
use ledger::Ledger;

use crate::services;

/// Quota, credits, prices and appeal statistics for the dashboard.
///
/// # Arguments
///
/// * `claims` - The JWT claims of the authenticated user.
/// * `ledger` - The entitlement ledger.
/// * `config` - The application configuration, for prices.
///
/// # Returns
///
/// A `Result` containing the usage summary or an `AppError`.
#[get("")]
pub async fn get_usage(
    claims: web::ReqData<JwtClaims>,
    ledger: web::Data<Ledger>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let record = ledger.load_or_create(&claims).await?;
    let usage = services::usage::usage(&ledger, record, &config.pricing).await?;
    Success::ok(usage)
}
