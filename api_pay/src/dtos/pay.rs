use chrono::{DateTime, Utc};
use common::payment::{PaymentStatus, PaymentType};
use db::models::payment::PaymentRecord;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct IntentRequest {
    pub payment_type: PaymentType,
    /// The draft to unlock once an `additional_appeal` payment succeeds.
    pub appeal_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub intent_id: String,
    pub client_secret: String,
    pub payment_type: PaymentType,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentItem {
    pub id: Uuid,
    pub intent_id: String,
    pub payment_type: PaymentType,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub appeal_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentRecord> for PaymentItem {
    fn from(p: PaymentRecord) -> Self {
        PaymentItem {
            id: p.id,
            intent_id: p.intent_id,
            payment_type: p.payment_type,
            amount: p.amount,
            currency: p.currency,
            status: p.status,
            appeal_id: p.appeal_id,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}
