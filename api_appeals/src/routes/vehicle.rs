use actix_web::{
    HttpResponse, Responder, delete, get, post,
    web::{self},
};
use common::{error::Res, http::Success, jwt::JwtClaims};
use ledger::Ledger;

use crate::{dtos::vehicle::VehicleRequest, services};

#[get("")]
pub async fn get_vehicles(
    claims: web::ReqData<JwtClaims>,
    ledger: web::Data<Ledger>,
) -> Res<impl Responder> {
    let record = ledger.load_or_create(&claims).await?;
    Success::ok(services::vehicle::list_vehicles(record))
}

/// Registers or changes the vehicle. The first plate is free; a different
/// plate needs a confirmed `vehicle_addition` payment and otherwise yields 402.
#[post("")]
pub async fn post_vehicle(
    claims: web::ReqData<JwtClaims>,
    ledger: web::Data<Ledger>,
    req: web::Json<VehicleRequest>,
) -> Res<impl Responder> {
    ledger.load_or_create(&claims).await?;
    let vehicle =
        services::vehicle::register_vehicle(&ledger, claims.user_id, &req.registration).await?;
    Success::created(vehicle)
}

/// Always rejected: 400 for the registered primary slot, 404 otherwise.
#[delete("/{id}")]
pub async fn delete_vehicle(
    claims: web::ReqData<JwtClaims>,
    ledger: web::Data<Ledger>,
    path: web::Path<String>,
) -> Res<HttpResponse> {
    let record = ledger.load_or_create(&claims).await?;
    Err(services::vehicle::removal_error(&record, &path))
}
