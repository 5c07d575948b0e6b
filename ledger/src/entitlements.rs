use std::sync::Arc;

use common::{
    error::{AppError, Res},
    jwt::JwtClaims,
    payment::{PaymentEvent, PaymentProcessor, PaymentType},
};
use db::{
    Store,
    dtos::{
        entitlement::{AppealCharge, ProfileUpsert, VehicleWrite},
        payment::NewPayment,
    },
    models::{
        appeal::{AppealRecord, LetterCharge},
        entitlement::EntitlementRecord,
        payment::{PaymentRecord, Settlement},
    },
};
use uuid::Uuid;

use crate::{
    clock::{Clock, reset_due, start_of_month},
    gate::{Action, Decision, decide},
    plate::normalize_plate,
};

/// What a processor event did to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Granted {
        payment: PaymentRecord,
        entitlement: EntitlementRecord,
    },
    Failed(PaymentRecord),
    /// The intent had already settled; nothing changed.
    Duplicate,
}

fn not_found() -> AppError {
    AppError::NotFound("Entitlement record not found".to_string())
}

fn appeal_charge(is_free: bool) -> AppealCharge {
    if is_free {
        AppealCharge::Free
    } else {
        AppealCharge::Paid
    }
}

/// The usage and quota state machine. All counter writes go through guarded
/// store updates, so concurrent requests cannot overspend an allowance.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Ledger { store, clock }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Profile write. Creates the record on first call.
    pub async fn upsert_profile(&self, data: ProfileUpsert) -> Res<EntitlementRecord> {
        let record = self.store.upsert_profile(data, self.clock.now()).await?;
        self.apply_monthly_reset(record).await
    }

    /// Reads the caller's record, creating it from the token claims on first visit.
    pub async fn load_or_create(&self, claims: &JwtClaims) -> Res<EntitlementRecord> {
        match self.get_entitlement(claims.user_id).await {
            Err(AppError::NotFound(_)) => {
                log::info!("Creating entitlement record for user {}", claims.user_id);
                self.upsert_profile(ProfileUpsert {
                    user_id: claims.user_id,
                    email: claims.email.clone(),
                    display_name: None,
                })
                .await
            }
            other => other,
        }
    }

    /// Reads the record, applying the monthly reset first when one is due.
    pub async fn get_entitlement(&self, user_id: Uuid) -> Res<EntitlementRecord> {
        let record = self
            .store
            .get_entitlement(user_id)
            .await?
            .ok_or_else(not_found)?;
        self.apply_monthly_reset(record).await
    }

    async fn apply_monthly_reset(&self, record: EntitlementRecord) -> Res<EntitlementRecord> {
        let now = self.clock.now();
        if !reset_due(record.last_free_appeal_reset, now) {
            return Ok(record);
        }

        let user_id = record.user_id;
        match self
            .store
            .reset_free_appeals(user_id, start_of_month(now), now)
            .await?
        {
            Some(reset) => {
                log::info!("Monthly free appeal reset for user {}", user_id);
                Ok(reset)
            }
            // A concurrent reader reset it first.
            None => self
                .store
                .get_entitlement(user_id)
                .await?
                .ok_or_else(not_found),
        }
    }

    pub async fn has_free_appeal_available(&self, user_id: Uuid) -> Res<bool> {
        Ok(self.get_entitlement(user_id).await?.free_appeals_used == 0)
    }

    /// Gate decision for `action` against the current record.
    pub async fn check(&self, user_id: Uuid, action: Action<'_>) -> Res<Decision> {
        let record = self.get_entitlement(user_id).await?;
        Ok(decide(&record, action))
    }

    /// Counts a generated appeal against the free allowance or a paid credit.
    /// Fails with 402 when the chosen allowance is no longer there.
    pub async fn record_appeal_created(
        &self,
        user_id: Uuid,
        is_free: bool,
        ticket_value: i64,
    ) -> Res<EntitlementRecord> {
        // Ensures the record exists and this month's reset has landed.
        self.get_entitlement(user_id).await?;

        self.store
            .consume_appeal(user_id, appeal_charge(is_free), ticket_value, self.clock.now())
            .await?
            .ok_or_else(|| AppError::payment_required(PaymentType::AdditionalAppeal))
    }

    /// Free when the slot is empty or already holds this plate; otherwise
    /// consumes a vehicle change credit or fails with 402 leaving the stored
    /// plate untouched.
    pub async fn register_vehicle(&self, user_id: Uuid, plate: &str) -> Res<EntitlementRecord> {
        let plate = normalize_plate(plate)?;
        let record = self.get_entitlement(user_id).await?;

        let action = match record.vehicle_registration {
            None => Action::AddVehicle(&plate),
            Some(_) => Action::ChangeVehicle(&plate),
        };
        if let Decision::RequirePayment(payment_type) = decide(&record, action) {
            return Err(AppError::payment_required(payment_type));
        }

        let now = self.clock.now();
        if let Some(updated) = self
            .store
            .set_vehicle(user_id, &plate, VehicleWrite::VacantOrSame, now)
            .await?
        {
            return Ok(updated);
        }
        let updated = self
            .store
            .set_vehicle(user_id, &plate, VehicleWrite::UseCredit, now)
            .await?
            .ok_or_else(|| AppError::payment_required(PaymentType::VehicleAddition))?;
        log::info!("User {} changed vehicle using a paid credit", user_id);
        Ok(updated)
    }

    /// Unlocks the next paid write. No appeal or plate is written here.
    pub async fn apply_payment_succeeded(
        &self,
        user_id: Uuid,
        payment_type: PaymentType,
    ) -> Res<EntitlementRecord> {
        let record = self
            .store
            .grant_credit(user_id, payment_type, self.clock.now())
            .await?
            .ok_or_else(not_found)?;
        log::info!("Granted {} credit to user {}", payment_type, user_id);
        Ok(record)
    }

    /// Settles the payment row and, on success, grants the matching credit in
    /// the same store write. A failed intent can still succeed later; a
    /// repeated status or anything after success is a no-op.
    pub async fn apply_payment_event(&self, event: &PaymentEvent) -> Res<PaymentOutcome> {
        if !event.status.is_terminal() {
            return Err(AppError::BadRequest(format!(
                "Payment {} has not settled",
                event.intent_id
            )));
        }

        let settled = self
            .store
            .settle_payment(
                NewPayment {
                    user_id: event.metadata.user_id,
                    intent_id: event.intent_id.clone(),
                    payment_type: event.metadata.payment_type,
                    amount: event.amount,
                    currency: event.currency.clone(),
                    status: event.status,
                    appeal_id: event.metadata.appeal_id,
                },
                self.clock.now(),
            )
            .await?;

        let Some(Settlement {
            payment,
            entitlement,
        }) = settled
        else {
            log::info!("Ignoring duplicate event for payment {}", event.intent_id);
            return Ok(PaymentOutcome::Duplicate);
        };

        match entitlement {
            Some(entitlement) => {
                log::info!(
                    "Granted {} credit to user {}",
                    payment.payment_type,
                    payment.user_id
                );
                Ok(PaymentOutcome::Granted {
                    payment,
                    entitlement,
                })
            }
            None => {
                log::warn!(
                    "Payment {} failed for user {}",
                    payment.intent_id,
                    payment.user_id
                );
                Ok(PaymentOutcome::Failed(payment))
            }
        }
    }

    /// Stores `letter` on a draft and charges the chosen allowance in one
    /// write. `None` when the draft already had a letter; nothing is charged.
    pub async fn attach_letter_charged(
        &self,
        user_id: Uuid,
        appeal_id: Uuid,
        is_free: bool,
        letter: &str,
    ) -> Res<Option<(AppealRecord, EntitlementRecord)>> {
        self.get_entitlement(user_id).await?;

        match self
            .store
            .attach_charged_letter(
                user_id,
                appeal_id,
                letter,
                appeal_charge(is_free),
                self.clock.now(),
            )
            .await?
        {
            LetterCharge::Charged {
                appeal,
                entitlement,
            } => Ok(Some((appeal, entitlement))),
            LetterCharge::AlreadyAttached => Ok(None),
            LetterCharge::AllowanceUsed => Err(
                AppError::payment_required(PaymentType::AdditionalAppeal).with_appeal(appeal_id),
            ),
        }
    }

    /// Returns the stored processor customer, creating one on first use.
    pub async fn ensure_payment_customer(
        &self,
        user_id: Uuid,
        processor: &dyn PaymentProcessor,
    ) -> Res<String> {
        let record = self.get_entitlement(user_id).await?;
        if let Some(existing) = record.payment_customer_ref {
            return Ok(existing);
        }

        let email = record.email.as_deref().unwrap_or_default();
        let name = record.display_name.as_deref().unwrap_or(email);
        let customer_ref = processor.create_customer(email, name).await?;

        match self
            .store
            .set_payment_customer(user_id, &customer_ref, self.clock.now())
            .await?
        {
            Some(_) => Ok(customer_ref),
            None => self
                .store
                .get_entitlement(user_id)
                .await?
                .and_then(|r| r.payment_customer_ref)
                .ok_or_else(not_found),
        }
    }
}
