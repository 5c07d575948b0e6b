use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    error::{AppError, Res},
    payment::{PaymentStatus, PaymentType},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    appeal,
    dtos::{
        appeal::NewAppeal,
        entitlement::{AppealCharge, ProfileUpsert, VehicleWrite},
        payment::NewPayment,
    },
    entitlement,
    models::{
        appeal::{AppealRecord, AppealStatus, LetterCharge},
        entitlement::EntitlementRecord,
        payment::{PaymentRecord, Settlement},
    },
    payment,
};

/// Persistence seam. Every method that returns `Option` is a guarded write:
/// `None` means the guard did not hold and nothing changed.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_entitlement(&self, user_id: Uuid) -> Res<Option<EntitlementRecord>>;
    async fn upsert_profile(&self, data: ProfileUpsert, now: DateTime<Utc>)
    -> Res<EntitlementRecord>;
    async fn reset_free_appeals(
        &self,
        user_id: Uuid,
        month_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Res<Option<EntitlementRecord>>;
    async fn consume_appeal(
        &self,
        user_id: Uuid,
        charge: AppealCharge,
        ticket_value: i64,
        now: DateTime<Utc>,
    ) -> Res<Option<EntitlementRecord>>;
    async fn grant_credit(
        &self,
        user_id: Uuid,
        payment_type: PaymentType,
        now: DateTime<Utc>,
    ) -> Res<Option<EntitlementRecord>>;
    async fn set_vehicle(
        &self,
        user_id: Uuid,
        plate: &str,
        write: VehicleWrite,
        now: DateTime<Utc>,
    ) -> Res<Option<EntitlementRecord>>;
    async fn set_payment_customer(
        &self,
        user_id: Uuid,
        customer_ref: &str,
        now: DateTime<Utc>,
    ) -> Res<Option<EntitlementRecord>>;

    async fn insert_appeal(&self, data: NewAppeal, now: DateTime<Utc>) -> Res<AppealRecord>;
    async fn get_appeal(&self, user_id: Uuid, appeal_id: Uuid) -> Res<Option<AppealRecord>>;
    async fn list_appeals(&self, user_id: Uuid) -> Res<Vec<AppealRecord>>;
    /// Stores the letter on a letterless appeal and consumes `charge` for it,
    /// both or neither.
    async fn attach_charged_letter(
        &self,
        user_id: Uuid,
        appeal_id: Uuid,
        letter: &str,
        charge: AppealCharge,
        now: DateTime<Utc>,
    ) -> Res<LetterCharge>;
    async fn update_appeal_status(
        &self,
        user_id: Uuid,
        appeal_id: Uuid,
        from: AppealStatus,
        to: AppealStatus,
        now: DateTime<Utc>,
    ) -> Res<Option<AppealRecord>>;

    async fn insert_payment(&self, data: NewPayment, now: DateTime<Utc>) -> Res<PaymentRecord>;
    /// Settles the payment and grants the credit for a success in the same
    /// write. Fails without settling when the user has no entitlement row.
    async fn settle_payment(&self, data: NewPayment, now: DateTime<Utc>)
    -> Res<Option<Settlement>>;
    async fn list_payments(&self, user_id: Uuid) -> Res<Vec<PaymentRecord>>;
}

#[derive(Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        PgStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn get_entitlement(&self, user_id: Uuid) -> Res<Option<EntitlementRecord>> {
        entitlement::get_entitlement(self.pool(), &user_id).await
    }

    async fn upsert_profile(
        &self,
        data: ProfileUpsert,
        now: DateTime<Utc>,
    ) -> Res<EntitlementRecord> {
        entitlement::upsert_profile(self.pool(), data, now).await
    }

    async fn reset_free_appeals(
        &self,
        user_id: Uuid,
        month_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Res<Option<EntitlementRecord>> {
        entitlement::reset_free_appeals(self.pool(), &user_id, month_start, now).await
    }

    async fn consume_appeal(
        &self,
        user_id: Uuid,
        charge: AppealCharge,
        ticket_value: i64,
        now: DateTime<Utc>,
    ) -> Res<Option<EntitlementRecord>> {
        entitlement::consume_appeal(self.pool(), &user_id, charge, ticket_value, now).await
    }

    async fn grant_credit(
        &self,
        user_id: Uuid,
        payment_type: PaymentType,
        now: DateTime<Utc>,
    ) -> Res<Option<EntitlementRecord>> {
        entitlement::grant_credit(self.pool(), &user_id, payment_type, now).await
    }

    async fn set_vehicle(
        &self,
        user_id: Uuid,
        plate: &str,
        write: VehicleWrite,
        now: DateTime<Utc>,
    ) -> Res<Option<EntitlementRecord>> {
        entitlement::set_vehicle(self.pool(), &user_id, plate, write, now).await
    }

    async fn set_payment_customer(
        &self,
        user_id: Uuid,
        customer_ref: &str,
        now: DateTime<Utc>,
    ) -> Res<Option<EntitlementRecord>> {
        entitlement::set_payment_customer(self.pool(), &user_id, customer_ref, now).await
    }

    async fn insert_appeal(&self, data: NewAppeal, now: DateTime<Utc>) -> Res<AppealRecord> {
        appeal::insert_appeal(self.pool(), data, now).await
    }

    async fn get_appeal(&self, user_id: Uuid, appeal_id: Uuid) -> Res<Option<AppealRecord>> {
        appeal::get_appeal(self.pool(), &user_id, &appeal_id).await
    }

    async fn list_appeals(&self, user_id: Uuid) -> Res<Vec<AppealRecord>> {
        appeal::list_appeals(self.pool(), &user_id).await
    }

    async fn attach_charged_letter(
        &self,
        user_id: Uuid,
        appeal_id: Uuid,
        letter: &str,
        charge: AppealCharge,
        now: DateTime<Utc>,
    ) -> Res<LetterCharge> {
        // The appeal row stays locked until commit, so a concurrent unlock
        // sees the letter and charges nothing.
        let mut tx = self.pool().begin().await?;
        let Some(appeal) =
            appeal::attach_letter(&mut *tx, &user_id, &appeal_id, letter, now).await?
        else {
            return Ok(LetterCharge::AlreadyAttached);
        };
        let Some(entitlement) =
            entitlement::consume_appeal(&mut *tx, &user_id, charge, appeal.ticket_value, now)
                .await?
        else {
            tx.rollback().await?;
            return Ok(LetterCharge::AllowanceUsed);
        };
        tx.commit().await?;
        Ok(LetterCharge::Charged {
            appeal,
            entitlement,
        })
    }

    async fn update_appeal_status(
        &self,
        user_id: Uuid,
        appeal_id: Uuid,
        from: AppealStatus,
        to: AppealStatus,
        now: DateTime<Utc>,
    ) -> Res<Option<AppealRecord>> {
        appeal::update_appeal_status(self.pool(), &user_id, &appeal_id, from, to, now).await
    }

    async fn insert_payment(&self, data: NewPayment, now: DateTime<Utc>) -> Res<PaymentRecord> {
        payment::insert_payment(self.pool(), data, now).await
    }

    async fn settle_payment(
        &self,
        data: NewPayment,
        now: DateTime<Utc>,
    ) -> Res<Option<Settlement>> {
        let mut tx = self.pool().begin().await?;
        let Some(payment) = payment::settle_payment(&mut *tx, data, now).await? else {
            return Ok(None);
        };
        let entitlement = match payment.status {
            PaymentStatus::Succeeded => Some(
                entitlement::grant_credit(&mut *tx, &payment.user_id, payment.payment_type, now)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Entitlement not found".to_string()))?,
            ),
            _ => None,
        };
        tx.commit().await?;
        Ok(Some(Settlement {
            payment,
            entitlement,
        }))
    }

    async fn list_payments(&self, user_id: Uuid) -> Res<Vec<PaymentRecord>> {
        payment::list_payments(self.pool(), &user_id).await
    }
}
