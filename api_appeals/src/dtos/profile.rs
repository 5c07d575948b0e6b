use chrono::{DateTime, Utc};
use db::models::entitlement::EntitlementRecord;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct ProfileRequest {
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub vehicle_registration: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<EntitlementRecord> for ProfileResponse {
    fn from(record: EntitlementRecord) -> Self {
        ProfileResponse {
            user_id: record.user_id,
            email: record.email,
            display_name: record.display_name,
            vehicle_registration: record.vehicle_registration,
            created_at: record.created_at,
        }
    }
}
