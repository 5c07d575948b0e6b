use serde::{Deserialize, Serialize};

/// The only vehicle slot. Its id is always `primary`.
pub const PRIMARY_VEHICLE_ID: &str = "primary";

#[derive(Debug, Deserialize)]
pub struct VehicleRequest {
    pub registration: String,
}

#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: &'static str,
    pub registration: String,
    pub is_primary: bool,
}

impl VehicleResponse {
    pub fn primary(registration: String) -> Self {
        VehicleResponse {
            id: PRIMARY_VEHICLE_ID,
            registration,
            is_primary: true,
        }
    }
}
