use common::error::{AppError, Res};
use db::models::entitlement::EntitlementRecord;
use ledger::Ledger;
use uuid::Uuid;

use crate::dtos::vehicle::{PRIMARY_VEHICLE_ID, VehicleResponse};

pub fn list_vehicles(record: EntitlementRecord) -> Vec<VehicleResponse> {
    record
        .vehicle_registration
        .map(VehicleResponse::primary)
        .into_iter()
        .collect()
}

pub async fn register_vehicle(
    ledger: &Ledger,
    user_id: Uuid,
    registration: &str,
) -> Res<VehicleResponse> {
    let record = ledger.register_vehicle(user_id, registration).await?;
    record
        .vehicle_registration
        .map(VehicleResponse::primary)
        .ok_or_else(|| AppError::Internal("Vehicle write returned no plate".to_string()))
}

/// Why a vehicle cannot be removed: the primary slot cannot be emptied and
/// every other id is unknown.
pub fn removal_error(record: &EntitlementRecord, vehicle_id: &str) -> AppError {
    if vehicle_id == PRIMARY_VEHICLE_ID && record.vehicle_registration.is_some() {
        return AppError::BadRequest("Cannot remove primary vehicle".to_string());
    }
    AppError::NotFound("Vehicle not found".to_string())
}
