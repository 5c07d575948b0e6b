use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use actix_web::{App, http::StatusCode, test, web};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use common::{
    env_config::Config,
    error::{AppError, Res},
    jwt::{ClaimsSpec, generate_jwt},
    payment::{
        CreatedIntent, IntentRequest, PaymentEvent, PaymentMetadata, PaymentProcessor,
        PaymentStatus, PaymentType,
    },
};
use db::MemoryStore;
use ledger::{FixedClock, Ledger};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

const SIGNAGE: &str = "The sign was completely unclear and obscured by a tree";

/// Accepts webhooks signed "valid" whose body is a flat JSON event.
#[derive(Default)]
struct FakeProcessor {
    customers: AtomicUsize,
    intents: AtomicUsize,
}

#[derive(Deserialize)]
struct FakeEvent {
    kind: String,
    intent_id: String,
    status: PaymentStatus,
    user_id: Uuid,
    payment_type: PaymentType,
    appeal_id: Option<Uuid>,
    amount: i64,
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn create_customer(&self, _email: &str, _name: &str) -> Res<String> {
        let n = self.customers.fetch_add(1, Ordering::SeqCst);
        Ok(format!("cus_{}", n))
    }

    async fn create_payment_intent(&self, req: IntentRequest) -> Res<CreatedIntent> {
        assert!(req.customer_ref.starts_with("cus_"));
        let n = self.intents.fetch_add(1, Ordering::SeqCst);
        Ok(CreatedIntent {
            intent_id: format!("pi_{}", n),
            client_secret: format!("pi_{}_secret", n),
        })
    }

    fn parse_webhook(&self, payload: &str, signature: &str) -> Res<Option<PaymentEvent>> {
        if signature != "valid" {
            return Err(AppError::BadRequest("Invalid webhook signature".to_string()));
        }
        let event: FakeEvent = serde_json::from_str(payload)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if event.kind != "payment_intent" {
            return Ok(None);
        }
        Ok(Some(PaymentEvent {
            intent_id: event.intent_id,
            status: event.status,
            metadata: PaymentMetadata {
                user_id: event.user_id,
                payment_type: event.payment_type,
                appeal_id: event.appeal_id,
            },
            amount: event.amount,
            currency: "gbp".to_string(),
        }))
    }
}

struct Harness {
    config: Arc<Config>,
    ledger: Ledger,
    processor: Arc<FakeProcessor>,
}

impl Harness {
    fn new() -> Self {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap(),
        ));
        Harness {
            config: Config::for_tests("pay-test-secret"),
            ledger: Ledger::new(Arc::new(MemoryStore::new()), clock),
            processor: Arc::new(FakeProcessor::default()),
        }
    }

    fn token(&self, user_id: Uuid) -> String {
        let token = generate_jwt(
            ClaimsSpec {
                user_id,
                email: Some("driver@example.com".to_string()),
            },
            &self.config.jwt_config,
        )
        .unwrap();
        format!("Bearer {}", token)
    }

    fn processor(&self) -> Arc<dyn PaymentProcessor> {
        self.processor.clone()
    }
}

macro_rules! test_app {
    ($h:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($h.config.clone()))
                .app_data(web::Data::new($h.ledger.clone()))
                .app_data(web::Data::new($h.processor()))
                .app_data(common::http::json_config())
                .app_data(common::http::path_config())
                .wrap(extractor::middleware())
                .service(
                    web::scope("/api")
                        .service(api_pay::mount_webhook())
                        .service(
                            web::scope("/dashboard")
                                .wrap(extractor::require_user())
                                .service(api_appeals::mount_usage())
                                .service(api_appeals::mount_appeals())
                                .service(api_appeals::mount_vehicles())
                                .service(api_pay::mount_pay()),
                        ),
                ),
        )
        .await
    };
}

fn webhook(body: Value, signature: &str) -> actix_web::test::TestRequest {
    test::TestRequest::post()
        .uri("/api/pay/webhook")
        .insert_header(("Stripe-Signature", signature.to_string()))
        .set_payload(body.to_string())
}

fn succeeded(intent_id: &str, user_id: Uuid, payment_type: &str, appeal_id: Option<&str>) -> Value {
    json!({
        "kind": "payment_intent",
        "intent_id": intent_id,
        "status": "succeeded",
        "user_id": user_id,
        "payment_type": payment_type,
        "appeal_id": appeal_id,
        "amount": 500,
    })
}

#[actix_web::test]
async fn paid_appeal_flow_over_http() {
    let h = Harness::new();
    let app = test_app!(h);
    let user_id = Uuid::new_v4();
    let auth = h.token(user_id);

    let req = test::TestRequest::post()
        .uri("/api/dashboard/appeals")
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({ "text": SIGNAGE, "number_plate": "AB12CDE" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/dashboard/appeals")
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({ "text": SIGNAGE, "number_plate": "AB12CDE" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::PAYMENT_REQUIRED);
    let paywall: Value = test::read_body_json(res).await;
    let draft_id = paywall["appeal_id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/dashboard/pay/intent")
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({ "payment_type": "additional_appeal", "appeal_id": draft_id }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let intent: Value = test::read_body_json(res).await;
    assert_eq!(intent["amount"], 500);
    assert_eq!(intent["currency"], "gbp");
    let intent_id = intent["intent_id"].as_str().unwrap().to_string();
    assert!(intent["client_secret"].as_str().unwrap().starts_with(&intent_id));

    let req = test::TestRequest::get()
        .uri("/api/dashboard/pay/payments")
        .insert_header(("Authorization", auth.clone()))
        .to_request();
    let payments: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(payments[0]["status"], "pending");
    assert_eq!(payments[0]["appeal_id"], draft_id.as_str());

    let event = succeeded(&intent_id, user_id, "additional_appeal", Some(&draft_id));
    let res = test::call_service(&app, webhook(event.clone(), "valid").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let ack: Value = test::read_body_json(res).await;
    assert_eq!(ack["received"], true);

    // Redelivery is acknowledged but grants nothing further.
    let res = test::call_service(&app, webhook(event, "valid").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/dashboard/usage")
        .insert_header(("Authorization", auth.clone()))
        .to_request();
    let usage: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(usage["paid_appeal_credits"], 1);

    let req = test::TestRequest::post()
        .uri(&format!("/api/dashboard/appeals/{}/letter", draft_id))
        .insert_header(("Authorization", auth.clone()))
        .to_request();
    let unlocked: Value = test::call_and_read_body_json(&app, req).await;
    assert!(unlocked["letter"].is_string());

    // The letter exists now, so paying for it again is refused.
    let req = test::TestRequest::post()
        .uri("/api/dashboard/pay/intent")
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({ "payment_type": "additional_appeal", "appeal_id": draft_id }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/dashboard/pay/payments")
        .insert_header(("Authorization", auth))
        .to_request();
    let payments: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(payments.as_array().unwrap().len(), 1);
    assert_eq!(payments[0]["status"], "succeeded");

    // One customer per user, however many intents.
    assert_eq!(h.processor.customers.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn vehicle_change_needs_a_paid_credit() {
    let h = Harness::new();
    let app = test_app!(h);
    let user_id = Uuid::new_v4();
    let auth = h.token(user_id);

    let register = |plate: &str| {
        test::TestRequest::post()
            .uri("/api/dashboard/vehicles")
            .insert_header(("Authorization", auth.clone()))
            .set_json(json!({ "registration": plate }))
            .to_request()
    };

    assert_eq!(test::call_service(&app, register("AB12CDE")).await.status(), StatusCode::CREATED);
    assert_eq!(
        test::call_service(&app, register("XY34ZZZ")).await.status(),
        StatusCode::PAYMENT_REQUIRED
    );

    let req = test::TestRequest::post()
        .uri("/api/dashboard/pay/intent")
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({ "payment_type": "vehicle_addition" }))
        .to_request();
    let intent: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(intent["amount"], 300);
    let intent_id = intent["intent_id"].as_str().unwrap().to_string();

    let event = succeeded(&intent_id, user_id, "vehicle_addition", None);
    let res = test::call_service(&app, webhook(event, "valid").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);

    assert_eq!(test::call_service(&app, register("XY34ZZZ")).await.status(), StatusCode::CREATED);
    assert_eq!(
        test::call_service(&app, register("CD56EFG")).await.status(),
        StatusCode::PAYMENT_REQUIRED
    );
}

#[actix_web::test]
async fn webhook_rejects_bad_signatures_and_ignores_other_events() {
    let h = Harness::new();
    let app = test_app!(h);
    let user_id = Uuid::new_v4();
    let event = succeeded("pi_forged", user_id, "additional_appeal", None);

    let res = test::call_service(&app, webhook(event.clone(), "forged").to_request()).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/pay/webhook")
        .set_payload(event.to_string())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let mut other = event;
    other["kind"] = json!("customer");
    let res = test::call_service(&app, webhook(other, "valid").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);

    assert!(h.ledger.get_entitlement(user_id).await.is_err());
}

#[actix_web::test]
async fn intent_validates_the_appeal() {
    let h = Harness::new();
    let app = test_app!(h);
    let auth = h.token(Uuid::new_v4());

    let req = test::TestRequest::post()
        .uri("/api/dashboard/pay/intent")
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({ "payment_type": "additional_appeal", "appeal_id": Uuid::new_v4() }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/dashboard/pay/intent")
        .insert_header(("Authorization", auth.clone()))
        .set_json(json!({ "payment_type": "vehicle_addition", "appeal_id": Uuid::new_v4() }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/dashboard/pay/intent")
        .insert_header(("Authorization", auth))
        .set_json(json!({ "payment_type": "subscription" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    assert_eq!(h.processor.intents.load(Ordering::SeqCst), 0);
}
