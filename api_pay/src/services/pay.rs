use common::{
    env_config::PricingConfig,
    error::{AppError, Res},
    payment::{self, PaymentMetadata, PaymentProcessor, PaymentStatus, PaymentType},
};
use db::dtos::payment::NewPayment;
use ledger::{Ledger, PaymentOutcome};
use uuid::Uuid;

use crate::dtos::pay::{IntentRequest, IntentResponse, PaymentItem};

fn price_of(pricing: &PricingConfig, payment_type: PaymentType) -> i64 {
    match payment_type {
        PaymentType::AdditionalAppeal => pricing.additional_appeal,
        PaymentType::VehicleAddition => pricing.vehicle_addition,
    }
}

/// Opens a payment intent for one paid action and records it as pending.
/// Nothing is granted until the processor confirms the payment.
pub async fn create_intent(
    ledger: &Ledger,
    processor: &dyn PaymentProcessor,
    pricing: &PricingConfig,
    user_id: Uuid,
    req: IntentRequest,
) -> Res<IntentResponse> {
    if let Some(appeal_id) = req.appeal_id {
        if req.payment_type != PaymentType::AdditionalAppeal {
            return Err(AppError::BadRequest(
                "appeal_id is only valid for additional_appeal payments".to_string(),
            ));
        }
        let appeal = ledger
            .store()
            .get_appeal(user_id, appeal_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Appeal not found".to_string()))?;
        if appeal.letter_content.is_some() {
            return Err(AppError::BadRequest(
                "Appeal letter has already been generated".to_string(),
            ));
        }
    }

    let amount = price_of(pricing, req.payment_type);
    let customer_ref = ledger.ensure_payment_customer(user_id, processor).await?;
    let metadata = PaymentMetadata {
        user_id,
        payment_type: req.payment_type,
        appeal_id: req.appeal_id,
    };

    let created = processor
        .create_payment_intent(payment::IntentRequest {
            amount,
            currency: pricing.currency.clone(),
            customer_ref,
            metadata,
        })
        .await?;

    ledger
        .store()
        .insert_payment(
            NewPayment {
                user_id,
                intent_id: created.intent_id.clone(),
                payment_type: req.payment_type,
                amount,
                currency: pricing.currency.clone(),
                status: PaymentStatus::Pending,
                appeal_id: req.appeal_id,
            },
            ledger.now(),
        )
        .await?;
    log::info!(
        "Created {} payment intent {} for user {}",
        req.payment_type,
        created.intent_id,
        user_id
    );

    Ok(IntentResponse {
        intent_id: created.intent_id,
        client_secret: created.client_secret,
        payment_type: req.payment_type,
        amount,
        currency: pricing.currency.clone(),
    })
}

pub async fn list_payments(ledger: &Ledger, user_id: Uuid) -> Res<Vec<PaymentItem>> {
    let payments = ledger.store().list_payments(user_id).await?;
    Ok(payments.into_iter().map(PaymentItem::from).collect())
}

/// Verifies and applies one webhook delivery. Events we do not act on and
/// redelivered events are acknowledged without changes.
pub async fn process_webhook(
    ledger: &Ledger,
    processor: &dyn PaymentProcessor,
    payload: &str,
    signature: &str,
) -> Res<()> {
    let Some(event) = processor.parse_webhook(payload, signature)? else {
        return Ok(());
    };

    match ledger.apply_payment_event(&event).await? {
        PaymentOutcome::Granted { payment, .. } => log::info!(
            "Payment {} succeeded for user {}",
            payment.intent_id,
            payment.user_id
        ),
        PaymentOutcome::Failed(payment) => {
            log::info!("Recorded failed payment {}", payment.intent_id)
        }
        PaymentOutcome::Duplicate => {}
    }
    Ok(())
}
