use analysis::TicketDetails;
use chrono::{DateTime, Utc};
use db::models::appeal::{AppealRecord, AppealStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateAppealRequest {
    pub text: String,
    /// Defaults to the registered vehicle, then to the plate read off the ticket.
    pub number_plate: Option<String>,
    /// Penalty amount in pence.
    pub ticket_value: Option<i64>,
    pub ticket: Option<TicketDetails>,
    pub sender_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UnlockLetterRequest {
    pub sender_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppealStatus,
}

#[derive(Debug, Serialize)]
pub struct AppealResponse {
    pub id: Uuid,
    pub number_plate: String,
    pub ticket_value: i64,
    pub status: AppealStatus,
    pub issues: Vec<String>,
    pub success_probability: i16,
    pub letter: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AppealRecord> for AppealResponse {
    fn from(appeal: AppealRecord) -> Self {
        AppealResponse {
            id: appeal.id,
            number_plate: appeal.number_plate,
            ticket_value: appeal.ticket_value,
            status: appeal.status,
            issues: appeal.issues,
            success_probability: appeal.success_probability,
            letter: appeal.letter_content,
            created_at: appeal.created_at,
            updated_at: appeal.updated_at,
        }
    }
}
