use chrono::{DateTime, Utc};
use common::payment::{PaymentStatus, PaymentType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{UnknownVariant, entitlement::EntitlementRecord};

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct PaymentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub intent_id: String,
    pub payment_type: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub appeal_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Audit row for one payment intent. `intent_id` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub intent_id: String,
    pub payment_type: PaymentType,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub appeal_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = UnknownVariant;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let payment_type = row
            .payment_type
            .parse()
            .map_err(|_| UnknownVariant::new("payment type", &row.payment_type))?;
        let status = row
            .status
            .parse()
            .map_err(|_| UnknownVariant::new("payment status", &row.status))?;
        Ok(PaymentRecord {
            id: row.id,
            user_id: row.user_id,
            intent_id: row.intent_id,
            payment_type,
            amount: row.amount,
            currency: row.currency,
            status,
            appeal_id: row.appeal_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A payment that changed status, with the credit granted by a success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub payment: PaymentRecord,
    /// Present exactly when the payment succeeded.
    pub entitlement: Option<EntitlementRecord>,
}
