use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-user quota and vehicle state. One row per user.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct EntitlementRecord {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub free_appeals_used: i32,
    pub paid_appeals_used: i32,
    pub total_appeals_created: i32,
    /// Confirmed payments for appeals not yet generated.
    pub paid_appeal_credits: i32,
    /// Confirmed payments for a plate change not yet made.
    pub vehicle_change_credits: i32,
    pub total_ticket_value: i64,
    pub last_free_appeal_reset: DateTime<Utc>,
    pub vehicle_registration: Option<String>,
    pub payment_customer_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntitlementRecord {
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        EntitlementRecord {
            user_id,
            email: None,
            display_name: None,
            free_appeals_used: 0,
            paid_appeals_used: 0,
            total_appeals_created: 0,
            paid_appeal_credits: 0,
            vehicle_change_credits: 0,
            total_ticket_value: 0,
            last_free_appeal_reset: now,
            vehicle_registration: None,
            payment_customer_ref: None,
            created_at: now,
            updated_at: now,
        }
    }
}
