use std::sync::Arc;

use actix_web::{
    HttpRequest, Responder, get, post,
    web::{self},
};
use common::{
    env_config::Config,
    error::{AppError, Res},
    http::Success,
    jwt::JwtClaims,
    payment::PaymentProcessor,
};
use ledger::Ledger;

use crate::{
    dtos::pay::{IntentRequest, WebhookAck},
    services,
};

/// Creates a payment intent for an additional appeal or a vehicle change.
///
/// # Arguments
///
/// * `claims` - The JWT claims of the authenticated user.
/// * `ledger` - The entitlement ledger.
/// * `processor` - The payment processor.
/// * `config` - The application configuration, for prices.
/// * `req` - What the payment is for.
///
/// # Returns
///
/// A `Result` containing the client secret the frontend confirms the
/// payment with, or an `AppError`.
#[post("/intent")]
pub async fn post_intent(
    claims: web::ReqData<JwtClaims>,
    ledger: web::Data<Ledger>,
    processor: web::Data<Arc<dyn PaymentProcessor>>,
    config: web::Data<Arc<Config>>,
    req: web::Json<IntentRequest>,
) -> Res<impl Responder> {
    ledger.load_or_create(&claims).await?;
    let intent = services::pay::create_intent(
        &ledger,
        processor.get_ref().as_ref(),
        &config.pricing,
        claims.user_id,
        req.into_inner(),
    )
    .await?;
    Success::created(intent)
}

/// Payment history, newest first.
#[get("/payments")]
pub async fn get_payments(
    claims: web::ReqData<JwtClaims>,
    ledger: web::Data<Ledger>,
) -> Res<impl Responder> {
    let payments = services::pay::list_payments(&ledger, claims.user_id).await?;
    Success::ok(payments)
}

/// Receives processor webhooks. The signature is checked before anything is applied.
#[post("/webhook")]
pub async fn post_webhook(
    http: HttpRequest,
    payload: String,
    ledger: web::Data<Ledger>,
    processor: web::Data<Arc<dyn PaymentProcessor>>,
) -> Res<impl Responder> {
    let signature = http
        .headers()
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Stripe-Signature header".to_string()))?;

    services::pay::process_webhook(&ledger, processor.get_ref().as_ref(), &payload, signature)
        .await?;
    Success::ok(WebhookAck { received: true })
}
