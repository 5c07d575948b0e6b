use actix_web::{
    Responder, get, post,
    web::{self},
};
use common::{error::Res, http::Success, jwt::JwtClaims};
use ledger::Ledger;

use crate::{
    dtos::profile::{ProfileRequest, ProfileResponse},
    services,
};

#[get("")]
pub async fn get_profile(
    claims: web::ReqData<JwtClaims>,
    ledger: web::Data<Ledger>,
) -> Res<impl Responder> {
    let record = ledger.load_or_create(&claims).await?;
    Success::ok(ProfileResponse::from(record))
}

/// Upserts the caller's profile. Omitted fields keep their stored value.
#[post("")]
pub async fn post_profile(
    claims: web::ReqData<JwtClaims>,
    ledger: web::Data<Ledger>,
    req: web::Json<ProfileRequest>,
) -> Res<impl Responder> {
    let profile = services::profile::update_profile(&ledger, &claims, req.into_inner()).await?;
    Success::ok(profile)
}
