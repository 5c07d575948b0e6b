use std::{collections::HashMap, fmt, str::FromStr};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Res};

/// What a one-off payment unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    AdditionalAppeal,
    VehicleAddition,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::AdditionalAppeal => "additional_appeal",
            PaymentType::VehicleAddition => "vehicle_addition",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PaymentType::AdditionalAppeal => "Additional PCN appeal",
            PaymentType::VehicleAddition => "Vehicle registration change",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = AppError;

    fn from_str(s: &str) -> Res<Self> {
        match s {
            "additional_appeal" => Ok(PaymentType::AdditionalAppeal),
            "vehicle_addition" => Ok(PaymentType::VehicleAddition),
            other => Err(AppError::BadRequest(format!(
                "Unknown payment type: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Res<Self> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "succeeded" => Ok(PaymentStatus::Succeeded),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(AppError::Internal(format!(
                "Unknown payment status: {}",
                other
            ))),
        }
    }
}

/// Metadata attached to every payment intent and echoed back by the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    pub user_id: Uuid,
    pub payment_type: PaymentType,
    pub appeal_id: Option<Uuid>,
}

impl PaymentMetadata {
    pub const USER_ID: &'static str = "userId";
    pub const PAYMENT_TYPE: &'static str = "paymentType";
    pub const APPEAL_ID: &'static str = "appealId";

    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(Self::USER_ID.to_string(), self.user_id.to_string());
        map.insert(
            Self::PAYMENT_TYPE.to_string(),
            self.payment_type.as_str().to_string(),
        );
        if let Some(appeal_id) = self.appeal_id {
            map.insert(Self::APPEAL_ID.to_string(), appeal_id.to_string());
        }
        map
    }

    /// Returns `None` when the processor echoed metadata we did not write.
    pub fn from_map(map: &HashMap<String, String>) -> Option<Self> {
        let user_id = map.get(Self::USER_ID)?.parse().ok()?;
        let payment_type = map.get(Self::PAYMENT_TYPE)?.parse().ok()?;
        let appeal_id = map.get(Self::APPEAL_ID).and_then(|id| id.parse().ok());
        Some(PaymentMetadata {
            user_id,
            payment_type,
            appeal_id,
        })
    }
}

/// Terminal payment notification delivered asynchronously by the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub intent_id: String,
    pub status: PaymentStatus,
    pub metadata: PaymentMetadata,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct IntentRequest {
    pub amount: i64,
    pub currency: String,
    pub customer_ref: String,
    pub metadata: PaymentMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIntent {
    pub intent_id: String,
    pub client_secret: String,
}

/// Boundary to the external payment processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_customer(&self, email: &str, name: &str) -> Res<String>;

    async fn create_payment_intent(&self, req: IntentRequest) -> Res<CreatedIntent>;

    /// Verifies the signature and decodes a webhook body.
    /// `Ok(None)` means the event is valid but not one we act on.
    fn parse_webhook(&self, payload: &str, signature: &str) -> Res<Option<PaymentEvent>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_survives_the_processor_round_trip() {
        let meta = PaymentMetadata {
            user_id: Uuid::new_v4(),
            payment_type: PaymentType::VehicleAddition,
            appeal_id: None,
        };
        assert_eq!(PaymentMetadata::from_map(&meta.to_map()), Some(meta));
    }

    #[test]
    fn foreign_metadata_is_ignored() {
        let mut map = HashMap::new();
        map.insert("userId".to_string(), "not-a-uuid".to_string());
        map.insert("paymentType".to_string(), "additional_appeal".to_string());
        assert_eq!(PaymentMetadata::from_map(&map), None);
    }
}
