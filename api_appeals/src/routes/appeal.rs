use actix_web::{
    Responder, get, post,
    web::{self},
};
use common::{error::Res, http::Success, jwt::JwtClaims};
use ledger::Ledger;
use uuid::Uuid;

use crate::{
    dtos::appeal::{AppealResponse, CreateAppealRequest, UnlockLetterRequest, UpdateStatusRequest},
    services,
};

/// Lists the caller's appeals, newest first.
#[get("")]
pub async fn get_appeals(
    claims: web::ReqData<JwtClaims>,
    ledger: web::Data<Ledger>,
) -> Res<impl Responder> {
    let appeals = services::appeal::list_appeals(&ledger, claims.user_id).await?;
    Success::ok(
        appeals
            .into_iter()
            .map(AppealResponse::from)
            .collect::<Vec<_>>(),
    )
}

/// Creates an appeal for the authenticated user.
///
/// # Arguments
///
/// * `claims` - The JWT claims of the authenticated user.
/// * `ledger` - The entitlement ledger.
/// * `req` - The driver's account plus optional plate, ticket value and ticket details.
///
/// # Returns
///
/// `201` with the appeal and its letter when the free allowance or a paid
/// credit covers it, otherwise `402` carrying the id of the stored draft.
#[post("")]
pub async fn post_appeal(
    claims: web::ReqData<JwtClaims>,
    ledger: web::Data<Ledger>,
    req: web::Json<CreateAppealRequest>,
) -> Res<impl Responder> {
    let record = ledger.load_or_create(&claims).await?;
    let appeal = services::appeal::create_appeal(&ledger, &record, req.into_inner()).await?;
    Success::created_at(
        format!("/api/dashboard/appeals/{}", appeal.id),
        AppealResponse::from(appeal),
    )
}

/// Generates the letter for a draft once payment has landed.
#[post("/{id}/letter")]
pub async fn post_letter(
    claims: web::ReqData<JwtClaims>,
    ledger: web::Data<Ledger>,
    path: web::Path<Uuid>,
    req: Option<web::Json<UnlockLetterRequest>>,
) -> Res<impl Responder> {
    let req = req.map(|r| r.into_inner()).unwrap_or_default();
    let appeal =
        services::appeal::unlock_letter(&ledger, claims.user_id, path.into_inner(), req).await?;
    Success::ok(AppealResponse::from(appeal))
}

/// Moves an appeal forward through its lifecycle.
///
/// # Arguments
///
/// * `claims` - The JWT claims of the authenticated user.
/// * `ledger` - The entitlement ledger.
/// * `path` - The appeal id.
/// * `req` - The requested status.
///
/// # Returns
///
/// The updated appeal, `400` for a backwards or unknown transition, or `404`.
#[post("/{id}/status")]
pub async fn post_status(
    claims: web::ReqData<JwtClaims>,
    ledger: web::Data<Ledger>,
    path: web::Path<Uuid>,
    req: web::Json<UpdateStatusRequest>,
) -> Res<impl Responder> {
    let appeal = services::appeal::update_status(
        &ledger,
        claims.user_id,
        path.into_inner(),
        req.status,
    )
    .await?;
    Success::ok(AppealResponse::from(appeal))
}
