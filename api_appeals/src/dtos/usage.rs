use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub withdrawn: usize,
    pub total_ticket_value: i64,
    /// Sum of ticket values on accepted appeals.
    pub total_savings: i64,
}

#[derive(Debug, Serialize)]
pub struct Prices {
    pub currency: String,
    pub additional_appeal: i64,
    pub vehicle_addition: i64,
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub free_appeals_used: i32,
    pub paid_appeals_used: i32,
    pub total_appeals_created: i32,
    pub has_free_appeal_available: bool,
    pub paid_appeal_credits: i32,
    pub vehicle_change_credits: i32,
    pub vehicle_registration: Option<String>,
    pub vehicles_registered: usize,
    pub last_free_appeal_reset: DateTime<Utc>,
    pub prices: Prices,
    pub stats: DashboardStats,
}
