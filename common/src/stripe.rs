use async_trait::async_trait;
use stripe::{
    Client, CreateCustomer, CreatePaymentIntent, Currency, Customer, CustomerId, Event,
    EventObject, EventType, PaymentIntent, Webhook,
};

use crate::{
    error::{AppError, Res},
    payment::{
        CreatedIntent, IntentRequest, PaymentEvent, PaymentMetadata, PaymentProcessor,
        PaymentStatus,
    },
};

pub fn create_client(secret_key: &str) -> Client {
    Client::new(secret_key)
}

pub async fn create_customer(client: &Client, email: &str, name: &str) -> Res<Customer> {
    let params = CreateCustomer {
        email: Some(email),
        name: Some(name),
        ..Default::default()
    };

    Customer::create(client, params)
        .await
        .map_err(AppError::from)
}

fn parse_currency(currency: &str) -> Res<Currency> {
    match currency {
        "gbp" => Ok(Currency::GBP),
        "eur" => Ok(Currency::EUR),
        "usd" => Ok(Currency::USD),
        other => Err(AppError::Internal(format!(
            "Unsupported payment currency: {}",
            other
        ))),
    }
}

/// Stripe-backed payment processor.
pub struct StripeProcessor {
    client: Client,
    webhook_secret: String,
}

impl StripeProcessor {
    pub fn new(secret_key: &str, webhook_secret: &str) -> Self {
        StripeProcessor {
            client: create_client(secret_key),
            webhook_secret: webhook_secret.to_string(),
        }
    }
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    async fn create_customer(&self, email: &str, name: &str) -> Res<String> {
        let customer = create_customer(&self.client, email, name).await?;
        Ok(customer.id.to_string())
    }

    async fn create_payment_intent(&self, req: IntentRequest) -> Res<CreatedIntent> {
        let customer_id = req.customer_ref.parse::<CustomerId>().map_err(|e| {
            AppError::Internal(format!(
                "Failed to parse customer id: {}. {}",
                req.customer_ref, e
            ))
        })?;

        let mut params = CreatePaymentIntent::new(req.amount, parse_currency(&req.currency)?);
        params.customer = Some(customer_id);
        params.metadata = Some(req.metadata.to_map());
        params.description = Some(req.metadata.payment_type.description());

        let intent = PaymentIntent::create(&self.client, params)
            .await
            .map_err(AppError::from)?;

        let client_secret = intent.client_secret.ok_or_else(|| {
            AppError::Internal(format!("Payment intent {} has no client secret", intent.id))
        })?;

        Ok(CreatedIntent {
            intent_id: intent.id.to_string(),
            client_secret,
        })
    }

    fn parse_webhook(&self, payload: &str, signature: &str) -> Res<Option<PaymentEvent>> {
        let event = construct_event(payload, signature, &self.webhook_secret)?;
        Ok(to_payment_event(event))
    }
}

/// Creates an event for the webhook based on the request payload and signature.
/// Requires a webhook secret key.
pub fn construct_event(payload: &str, signature: &str, webhook_secret: &str) -> Res<Event> {
    match Webhook::construct_event(payload, signature, webhook_secret) {
        Ok(event) => Ok(event),
        Err(e) => {
            log::error!("Error constructing webhook event: {}", e);
            Err(AppError::BadRequest(format!("Webhook Error: {}", e)))
        }
    }
}

/// Maps the Stripe events we act on into processor-neutral payment events.
fn to_payment_event(event: Event) -> Option<PaymentEvent> {
    let status = match event.type_ {
        EventType::PaymentIntentSucceeded => PaymentStatus::Succeeded,
        EventType::PaymentIntentPaymentFailed => PaymentStatus::Failed,
        _ => {
            log::info!("Unhandled event type: {}", event.type_);
            return None;
        }
    };

    let EventObject::PaymentIntent(intent) = event.data.object else {
        log::warn!("Event {} carried no payment intent", event.type_);
        return None;
    };

    let Some(metadata) = PaymentMetadata::from_map(&intent.metadata) else {
        log::error!("Payment intent {} has no usable metadata", intent.id);
        return None;
    };

    Some(PaymentEvent {
        intent_id: intent.id.to_string(),
        status,
        metadata,
        amount: intent.amount,
        currency: intent.currency.to_string(),
    })
}
