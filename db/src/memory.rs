use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    error::{AppError, Res},
    payment::{PaymentStatus, PaymentType},
};
use uuid::Uuid;

use crate::{
    dtos::{
        appeal::NewAppeal,
        entitlement::{AppealCharge, ProfileUpsert, VehicleWrite},
        payment::NewPayment,
    },
    models::{
        appeal::{AppealRecord, AppealStatus, LetterCharge},
        entitlement::EntitlementRecord,
        payment::{PaymentRecord, Settlement},
    },
    store::Store,
};

#[derive(Default)]
struct Tables {
    entitlements: HashMap<Uuid, EntitlementRecord>,
    appeals: Vec<AppealRecord>,
    payments: Vec<PaymentRecord>,
}

impl Tables {
    fn consume_appeal(
        &mut self,
        user_id: Uuid,
        charge: AppealCharge,
        ticket_value: i64,
        now: DateTime<Utc>,
    ) -> Option<EntitlementRecord> {
        let record = self.entitlements.get_mut(&user_id)?;
        match charge {
            AppealCharge::Free if record.free_appeals_used == 0 => {
                record.free_appeals_used += 1;
            }
            AppealCharge::Paid if record.paid_appeal_credits > 0 => {
                record.paid_appeal_credits -= 1;
                record.paid_appeals_used += 1;
            }
            _ => return None,
        }
        record.total_appeals_created += 1;
        record.total_ticket_value += ticket_value;
        record.updated_at = now;
        Some(record.clone())
    }

    fn grant_credit(
        &mut self,
        user_id: Uuid,
        payment_type: PaymentType,
        now: DateTime<Utc>,
    ) -> Option<EntitlementRecord> {
        self.entitlements.get_mut(&user_id).map(|r| {
            match payment_type {
                PaymentType::AdditionalAppeal => r.paid_appeal_credits += 1,
                PaymentType::VehicleAddition => r.vehicle_change_credits += 1,
            }
            r.updated_at = now;
            r.clone()
        })
    }
}

/// In-process store with the same guarded-write semantics as [`crate::store::PgStore`].
/// Each method holds the lock for its whole read-check-write.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Res<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal("Memory store lock poisoned".to_string()))
    }
}

fn newest_first<T, F>(rows: impl Iterator<Item = T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    let mut rows: Vec<T> = rows.collect();
    rows.reverse();
    rows.sort_by_key(|r| std::cmp::Reverse(created_at(r)));
    rows
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_entitlement(&self, user_id: Uuid) -> Res<Option<EntitlementRecord>> {
        Ok(self.tables()?.entitlements.get(&user_id).cloned())
    }

    async fn upsert_profile(
        &self,
        data: ProfileUpsert,
        now: DateTime<Utc>,
    ) -> Res<EntitlementRecord> {
        let mut tables = self.tables()?;
        let record = tables
            .entitlements
            .entry(data.user_id)
            .or_insert_with(|| EntitlementRecord::new(data.user_id, now));
        if data.email.is_some() || data.display_name.is_some() {
            if let Some(email) = data.email {
                record.email = Some(email);
            }
            if let Some(name) = data.display_name {
                record.display_name = Some(name);
            }
            record.updated_at = now;
        }
        Ok(record.clone())
    }

    async fn reset_free_appeals(
        &self,
        user_id: Uuid,
        month_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Res<Option<EntitlementRecord>> {
        let mut tables = self.tables()?;
        Ok(tables
            .entitlements
            .get_mut(&user_id)
            .filter(|r| r.last_free_appeal_reset < month_start)
            .map(|r| {
                r.free_appeals_used = 0;
                r.last_free_appeal_reset = now;
                r.updated_at = now;
                r.clone()
            }))
    }

    async fn consume_appeal(
        &self,
        user_id: Uuid,
        charge: AppealCharge,
        ticket_value: i64,
        now: DateTime<Utc>,
    ) -> Res<Option<EntitlementRecord>> {
        Ok(self
            .tables()?
            .consume_appeal(user_id, charge, ticket_value, now))
    }

    async fn grant_credit(
        &self,
        user_id: Uuid,
        payment_type: PaymentType,
        now: DateTime<Utc>,
    ) -> Res<Option<EntitlementRecord>> {
        Ok(self.tables()?.grant_credit(user_id, payment_type, now))
    }

    async fn set_vehicle(
        &self,
        user_id: Uuid,
        plate: &str,
        write: VehicleWrite,
        now: DateTime<Utc>,
    ) -> Res<Option<EntitlementRecord>> {
        let mut tables = self.tables()?;
        let Some(record) = tables.entitlements.get_mut(&user_id) else {
            return Ok(None);
        };
        match write {
            VehicleWrite::VacantOrSame => {
                if record
                    .vehicle_registration
                    .as_deref()
                    .is_some_and(|current| current != plate)
                {
                    return Ok(None);
                }
            }
            VehicleWrite::UseCredit => {
                if record.vehicle_change_credits <= 0 {
                    return Ok(None);
                }
                record.vehicle_change_credits -= 1;
            }
        }
        record.vehicle_registration = Some(plate.to_string());
        record.updated_at = now;
        Ok(Some(record.clone()))
    }

    async fn set_payment_customer(
        &self,
        user_id: Uuid,
        customer_ref: &str,
        now: DateTime<Utc>,
    ) -> Res<Option<EntitlementRecord>> {
        let mut tables = self.tables()?;
        Ok(tables
            .entitlements
            .get_mut(&user_id)
            .filter(|r| r.payment_customer_ref.is_none())
            .map(|r| {
                r.payment_customer_ref = Some(customer_ref.to_string());
                r.updated_at = now;
                r.clone()
            }))
    }

    async fn insert_appeal(&self, data: NewAppeal, now: DateTime<Utc>) -> Res<AppealRecord> {
        let mut tables = self.tables()?;
        if !tables.entitlements.contains_key(&data.user_id) {
            return Err(AppError::NotFound("Entitlement not found".to_string()));
        }
        let record = AppealRecord {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            number_plate: data.number_plate,
            ticket_value: data.ticket_value,
            source_text: data.source_text,
            letter_content: None,
            status: AppealStatus::Draft,
            issues: data.issues,
            success_probability: data.success_probability,
            created_at: now,
            updated_at: now,
        };
        tables.appeals.push(record.clone());
        Ok(record)
    }

    async fn get_appeal(&self, user_id: Uuid, appeal_id: Uuid) -> Res<Option<AppealRecord>> {
        Ok(self
            .tables()?
            .appeals
            .iter()
            .find(|a| a.id == appeal_id && a.user_id == user_id)
            .cloned())
    }

    async fn list_appeals(&self, user_id: Uuid) -> Res<Vec<AppealRecord>> {
        let tables = self.tables()?;
        Ok(newest_first(
            tables.appeals.iter().filter(|a| a.user_id == user_id).cloned(),
            |a: &AppealRecord| a.created_at,
        ))
    }

    async fn attach_charged_letter(
        &self,
        user_id: Uuid,
        appeal_id: Uuid,
        letter: &str,
        charge: AppealCharge,
        now: DateTime<Utc>,
    ) -> Res<LetterCharge> {
        let mut tables = self.tables()?;
        let Some(index) = tables
            .appeals
            .iter()
            .position(|a| a.id == appeal_id && a.user_id == user_id && a.letter_content.is_none())
        else {
            return Ok(LetterCharge::AlreadyAttached);
        };
        let ticket_value = tables.appeals[index].ticket_value;
        let Some(entitlement) = tables.consume_appeal(user_id, charge, ticket_value, now) else {
            return Ok(LetterCharge::AllowanceUsed);
        };

        let appeal = &mut tables.appeals[index];
        appeal.letter_content = Some(letter.to_string());
        appeal.updated_at = now;
        Ok(LetterCharge::Charged {
            appeal: appeal.clone(),
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
        let mut tables = self.tables()?;
        Ok(tables
            .appeals
            .iter_mut()
            .find(|a| a.id == appeal_id && a.user_id == user_id && a.status == from)
            .map(|a| {
                a.status = to;
                a.updated_at = now;
                a.clone()
            }))
    }

    async fn insert_payment(&self, data: NewPayment, now: DateTime<Utc>) -> Res<PaymentRecord> {
        let mut tables = self.tables()?;
        if tables.payments.iter().any(|p| p.intent_id == data.intent_id) {
            return Err(AppError::BadRequest(format!(
                "Payment {} already recorded",
                data.intent_id
            )));
        }
        let record = PaymentRecord {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            intent_id: data.intent_id,
            payment_type: data.payment_type,
            amount: data.amount,
            currency: data.currency,
            status: data.status,
            appeal_id: data.appeal_id,
            created_at: now,
            updated_at: now,
        };
        tables.payments.push(record.clone());
        Ok(record)
    }

    async fn settle_payment(
        &self,
        data: NewPayment,
        now: DateTime<Utc>,
    ) -> Res<Option<Settlement>> {
        let mut tables = self.tables()?;
        let existing = tables
            .payments
            .iter()
            .position(|p| p.intent_id == data.intent_id);
        if let Some(index) = existing {
            let current = tables.payments[index].status;
            if current == PaymentStatus::Succeeded || current == data.status {
                return Ok(None);
            }
        }

        let (owner, payment_type) = match existing {
            Some(index) => (tables.payments[index].user_id, tables.payments[index].payment_type),
            None => (data.user_id, data.payment_type),
        };
        // Grant before touching the payment so a missing row leaves it unsettled.
        let entitlement = match data.status {
            PaymentStatus::Succeeded => Some(
                tables
                    .grant_credit(owner, payment_type, now)
                    .ok_or_else(|| AppError::NotFound("Entitlement not found".to_string()))?,
            ),
            _ => None,
        };

        let payment = match existing {
            Some(index) => {
                let payment = &mut tables.payments[index];
                payment.status = data.status;
                payment.updated_at = now;
                payment.clone()
            }
            None => {
                let payment = PaymentRecord {
                    id: Uuid::new_v4(),
                    user_id: data.user_id,
                    intent_id: data.intent_id,
                    payment_type: data.payment_type,
                    amount: data.amount,
                    currency: data.currency,
                    status: data.status,
                    appeal_id: data.appeal_id,
                    created_at: now,
                    updated_at: now,
                };
                tables.payments.push(payment.clone());
                payment
            }
        };
        Ok(Some(Settlement {
            payment,
            entitlement,
        }))
    }

    async fn list_payments(&self, user_id: Uuid) -> Res<Vec<PaymentRecord>> {
        let tables = self.tables()?;
        Ok(newest_first(
            tables.payments.iter().filter(|p| p.user_id == user_id).cloned(),
            |p: &PaymentRecord| p.created_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, 12, 0, 0).unwrap()
    }

    async fn store_with_user() -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        store
            .upsert_profile(
                ProfileUpsert {
                    user_id,
                    ..Default::default()
                },
                at(1),
            )
            .await
            .unwrap();
        (store, user_id)
    }

    #[tokio::test]
    async fn free_appeal_can_only_be_consumed_once() {
        let (store, user_id) = store_with_user().await;
        let first = store
            .consume_appeal(user_id, AppealCharge::Free, 7000, at(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.free_appeals_used, 1);
        assert_eq!(first.total_ticket_value, 7000);

        let second = store
            .consume_appeal(user_id, AppealCharge::Free, 7000, at(2))
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn paid_appeal_needs_a_credit() {
        let (store, user_id) = store_with_user().await;
        assert!(
            store
                .consume_appeal(user_id, AppealCharge::Paid, 0, at(2))
                .await
                .unwrap()
                .is_none()
        );

        store
            .grant_credit(user_id, PaymentType::AdditionalAppeal, at(2))
            .await
            .unwrap();
        let record = store
            .consume_appeal(user_id, AppealCharge::Paid, 0, at(3))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.paid_appeal_credits, 0);
        assert_eq!(record.paid_appeals_used, 1);
        assert_eq!(record.total_appeals_created, 1);
    }

    #[tokio::test]
    async fn reset_only_applies_before_month_start() {
        let (store, user_id) = store_with_user().await;
        store
            .consume_appeal(user_id, AppealCharge::Free, 0, at(2))
            .await
            .unwrap();

        let november = Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap();
        assert!(
            store
                .reset_free_appeals(user_id, at(1), at(3))
                .await
                .unwrap()
                .is_none()
        );
        let reset = store
            .reset_free_appeals(user_id, november, november)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reset.free_appeals_used, 0);
        assert!(
            store
                .reset_free_appeals(user_id, november, november)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn vehicle_write_is_guarded() {
        let (store, user_id) = store_with_user().await;
        let write = VehicleWrite::VacantOrSame;
        assert!(store.set_vehicle(user_id, "AB12CDE", write, at(2)).await.unwrap().is_some());
        assert!(store.set_vehicle(user_id, "AB12CDE", write, at(2)).await.unwrap().is_some());
        assert!(store.set_vehicle(user_id, "XY99ZZZ", write, at(2)).await.unwrap().is_none());
        assert!(
            store
                .set_vehicle(user_id, "XY99ZZZ", VehicleWrite::UseCredit, at(2))
                .await
                .unwrap()
                .is_none()
        );

        store
            .grant_credit(user_id, PaymentType::VehicleAddition, at(3))
            .await
            .unwrap();
        let record = store
            .set_vehicle(user_id, "XY99ZZZ", VehicleWrite::UseCredit, at(3))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.vehicle_registration.as_deref(), Some("XY99ZZZ"));
        assert_eq!(record.vehicle_change_credits, 0);
    }

    #[tokio::test]
    async fn settle_payment_is_idempotent() {
        let (store, user_id) = store_with_user().await;
        let payment = NewPayment {
            user_id,
            intent_id: "pi_1".to_string(),
            payment_type: PaymentType::AdditionalAppeal,
            amount: 500,
            currency: "gbp".to_string(),
            status: PaymentStatus::Pending,
            appeal_id: None,
        };
        store.insert_payment(payment.clone(), at(2)).await.unwrap();

        let settled = NewPayment {
            status: PaymentStatus::Succeeded,
            ..payment
        };
        let first = store.settle_payment(settled.clone(), at(3)).await.unwrap().unwrap();
        assert_eq!(first.payment.status, PaymentStatus::Succeeded);
        assert_eq!(first.entitlement.unwrap().paid_appeal_credits, 1);
        assert!(store.settle_payment(settled, at(4)).await.unwrap().is_none());

        let late_failure = NewPayment {
            intent_id: "pi_1".to_string(),
            user_id,
            payment_type: PaymentType::AdditionalAppeal,
            amount: 500,
            currency: "gbp".to_string(),
            status: PaymentStatus::Failed,
            appeal_id: None,
        };
        assert!(store.settle_payment(late_failure, at(5)).await.unwrap().is_none());

        assert_eq!(store.list_payments(user_id).await.unwrap().len(), 1);
        let record = store.get_entitlement(user_id).await.unwrap().unwrap();
        assert_eq!(record.paid_appeal_credits, 1);
    }

    #[tokio::test]
    async fn failed_payment_can_still_succeed() {
        let (store, user_id) = store_with_user().await;
        let failed = NewPayment {
            user_id,
            intent_id: "pi_retry".to_string(),
            payment_type: PaymentType::VehicleAddition,
            amount: 300,
            currency: "gbp".to_string(),
            status: PaymentStatus::Failed,
            appeal_id: None,
        };
        let first = store.settle_payment(failed.clone(), at(2)).await.unwrap().unwrap();
        assert_eq!(first.entitlement, None);
        assert!(store.settle_payment(failed.clone(), at(2)).await.unwrap().is_none());

        let succeeded = NewPayment {
            status: PaymentStatus::Succeeded,
            ..failed
        };
        let settled = store.settle_payment(succeeded, at(3)).await.unwrap().unwrap();
        assert_eq!(settled.payment.status, PaymentStatus::Succeeded);
        assert_eq!(settled.entitlement.unwrap().vehicle_change_credits, 1);
    }

    #[tokio::test]
    async fn success_without_entitlement_stays_unsettled() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let payment = NewPayment {
            user_id,
            intent_id: "pi_orphan".to_string(),
            payment_type: PaymentType::AdditionalAppeal,
            amount: 500,
            currency: "gbp".to_string(),
            status: PaymentStatus::Succeeded,
            appeal_id: None,
        };
        assert!(matches!(
            store.settle_payment(payment.clone(), at(2)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(store.list_payments(user_id).await.unwrap().is_empty());

        store
            .upsert_profile(
                ProfileUpsert {
                    user_id,
                    ..Default::default()
                },
                at(3),
            )
            .await
            .unwrap();
        let settled = store.settle_payment(payment, at(3)).await.unwrap().unwrap();
        assert_eq!(settled.entitlement.unwrap().paid_appeal_credits, 1);
    }

    #[tokio::test]
    async fn letter_and_status_writes_are_compare_and_set() {
        let (store, user_id) = store_with_user().await;
        let appeal = store
            .insert_appeal(
                NewAppeal {
                    user_id,
                    number_plate: "AB12CDE".to_string(),
                    ticket_value: 0,
                    source_text: "sign obscured".to_string(),
                    issues: vec!["signage".to_string()],
                    success_probability: 70,
                },
                at(2),
            )
            .await
            .unwrap();

        let free = AppealCharge::Free;
        let charged = store
            .attach_charged_letter(user_id, appeal.id, "one", free, at(2))
            .await
            .unwrap();
        assert!(matches!(charged, LetterCharge::Charged { .. }));
        assert_eq!(
            store.attach_charged_letter(user_id, appeal.id, "two", free, at(2)).await.unwrap(),
            LetterCharge::AlreadyAttached
        );
        assert_eq!(
            store
                .attach_charged_letter(Uuid::new_v4(), appeal.id, "x", free, at(2))
                .await
                .unwrap(),
            LetterCharge::AlreadyAttached
        );
        let stored = store.get_appeal(user_id, appeal.id).await.unwrap().unwrap();
        assert_eq!(stored.letter_content.as_deref(), Some("one"));

        let moved = store
            .update_appeal_status(user_id, appeal.id, AppealStatus::Draft, AppealStatus::Submitted, at(3))
            .await
            .unwrap();
        assert_eq!(moved.unwrap().status, AppealStatus::Submitted);
        let stale = store
            .update_appeal_status(user_id, appeal.id, AppealStatus::Draft, AppealStatus::Withdrawn, at(3))
            .await
            .unwrap();
        assert!(stale.is_none());
    }

    #[tokio::test]
    async fn letter_is_not_stored_without_an_allowance() {
        let (store, user_id) = store_with_user().await;
        let draft = |value: i64| NewAppeal {
            user_id,
            number_plate: "AB12CDE".to_string(),
            ticket_value: value,
            source_text: "meter broken".to_string(),
            issues: vec!["payment-system".to_string()],
            success_probability: 55,
        };
        let first = store.insert_appeal(draft(3000), at(2)).await.unwrap();
        let second = store.insert_appeal(draft(5000), at(2)).await.unwrap();

        let charged = store
            .attach_charged_letter(user_id, first.id, "letter", AppealCharge::Free, at(2))
            .await
            .unwrap();
        let LetterCharge::Charged { entitlement, .. } = charged else {
            panic!("first letter should be charged");
        };
        assert_eq!(entitlement.total_ticket_value, 3000);

        assert_eq!(
            store
                .attach_charged_letter(user_id, second.id, "letter", AppealCharge::Free, at(2))
                .await
                .unwrap(),
            LetterCharge::AllowanceUsed
        );
        let untouched = store.get_appeal(user_id, second.id).await.unwrap().unwrap();
        assert_eq!(untouched.letter_content, None);
        let record = store.get_entitlement(user_id).await.unwrap().unwrap();
        assert_eq!(record.total_appeals_created, 1);
        assert_eq!(record.total_ticket_value, 3000);
    }

    #[tokio::test]
    async fn appeals_list_newest_first_per_user() {
        let (store, user_id) = store_with_user().await;
        for day in [2, 4, 3] {
            store
                .insert_appeal(
                    NewAppeal {
                        user_id,
                        number_plate: "AB12CDE".to_string(),
                        ticket_value: day as i64,
                        source_text: String::new(),
                        issues: vec![],
                        success_probability: 45,
                    },
                    at(day),
                )
                .await
                .unwrap();
        }
        let values: Vec<i64> = store
            .list_appeals(user_id)
            .await
            .unwrap()
            .iter()
            .map(|a| a.ticket_value)
            .collect();
        assert_eq!(values, vec![4, 3, 2]);
        assert!(store.list_appeals(Uuid::new_v4()).await.unwrap().is_empty());
    }
}
