use common::payment::{PaymentStatus, PaymentType};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_id: Uuid,
    pub intent_id: String,
    pub payment_type: PaymentType,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub appeal_id: Option<Uuid>,
}
