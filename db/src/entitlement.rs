use chrono::{DateTime, Utc};
use common::{
    error::{AppError, Res},
    payment::PaymentType,
};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    dtos::entitlement::{AppealCharge, ProfileUpsert, VehicleWrite},
    models::entitlement::EntitlementRecord,
};

pub async fn get_entitlement<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &Uuid,
) -> Res<Option<EntitlementRecord>> {
    sqlx::query_as::<_, EntitlementRecord>("SELECT * FROM entitlements WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

/// Creates the row on first sight. Later calls only overwrite profile fields
/// that were supplied.
pub async fn upsert_profile<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: ProfileUpsert,
    now: DateTime<Utc>,
) -> Res<EntitlementRecord> {
    sqlx::query_as::<_, EntitlementRecord>(
        r#"
        INSERT INTO entitlements (user_id, email, display_name, last_free_appeal_reset, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4, $4)
        ON CONFLICT (user_id) DO UPDATE SET
            email = COALESCE(EXCLUDED.email, entitlements.email),
            display_name = COALESCE(EXCLUDED.display_name, entitlements.display_name),
            updated_at = CASE
                WHEN EXCLUDED.email IS NULL AND EXCLUDED.display_name IS NULL THEN entitlements.updated_at
                ELSE EXCLUDED.updated_at
            END
        RETURNING *
        "#,
    )
    .bind(data.user_id)
    .bind(data.email)
    .bind(data.display_name)
    .bind(now)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Zeroes the monthly counter unless a reset already happened this month.
/// Returns `None` when another request got there first.
pub async fn reset_free_appeals<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &Uuid,
    month_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Res<Option<EntitlementRecord>> {
    sqlx::query_as::<_, EntitlementRecord>(
        r#"
        UPDATE entitlements
        SET free_appeals_used = 0, last_free_appeal_reset = $3, updated_at = $3
        WHERE user_id = $1 AND last_free_appeal_reset < $2
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(month_start)
    .bind(now)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn consume_appeal<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &Uuid,
    charge: AppealCharge,
    ticket_value: i64,
    now: DateTime<Utc>,
) -> Res<Option<EntitlementRecord>> {
    let query = match charge {
        AppealCharge::Free => {
            r#"
            UPDATE entitlements
            SET free_appeals_used = free_appeals_used + 1,
                total_appeals_created = total_appeals_created + 1,
                total_ticket_value = total_ticket_value + $2,
                updated_at = $3
            WHERE user_id = $1 AND free_appeals_used = 0
            RETURNING *
            "#
        }
        AppealCharge::Paid => {
            r#"
            UPDATE entitlements
            SET paid_appeals_used = paid_appeals_used + 1,
                paid_appeal_credits = paid_appeal_credits - 1,
                total_appeals_created = total_appeals_created + 1,
                total_ticket_value = total_ticket_value + $2,
                updated_at = $3
            WHERE user_id = $1 AND paid_appeal_credits > 0
            RETURNING *
            "#
        }
    };
    sqlx::query_as::<_, EntitlementRecord>(query)
        .bind(user_id)
        .bind(ticket_value)
        .bind(now)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn grant_credit<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &Uuid,
    payment_type: PaymentType,
    now: DateTime<Utc>,
) -> Res<Option<EntitlementRecord>> {
    let query = match payment_type {
        PaymentType::AdditionalAppeal => {
            "UPDATE entitlements SET paid_appeal_credits = paid_appeal_credits + 1, updated_at = $2 WHERE user_id = $1 RETURNING *"
        }
        PaymentType::VehicleAddition => {
            "UPDATE entitlements SET vehicle_change_credits = vehicle_change_credits + 1, updated_at = $2 WHERE user_id = $1 RETURNING *"
        }
    };
    sqlx::query_as::<_, EntitlementRecord>(query)
        .bind(user_id)
        .bind(now)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn set_vehicle<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &Uuid,
    plate: &str,
    write: VehicleWrite,
    now: DateTime<Utc>,
) -> Res<Option<EntitlementRecord>> {
    let query = match write {
        VehicleWrite::VacantOrSame => {
            r#"
            UPDATE entitlements SET vehicle_registration = $2, updated_at = $3
            WHERE user_id = $1 AND (vehicle_registration IS NULL OR vehicle_registration = $2)
            RETURNING *
            "#
        }
        VehicleWrite::UseCredit => {
            r#"
            UPDATE entitlements
            SET vehicle_registration = $2,
                vehicle_change_credits = vehicle_change_credits - 1,
                updated_at = $3
            WHERE user_id = $1 AND vehicle_change_credits > 0
            RETURNING *
            "#
        }
    };
    sqlx::query_as::<_, EntitlementRecord>(query)
        .bind(user_id)
        .bind(plate)
        .bind(now)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

/// First writer wins. Returns `None` when a reference was already stored.
pub async fn set_payment_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &Uuid,
    customer_ref: &str,
    now: DateTime<Utc>,
) -> Res<Option<EntitlementRecord>> {
    sqlx::query_as::<_, EntitlementRecord>(
        r#"
        UPDATE entitlements SET payment_customer_ref = $2, updated_at = $3
        WHERE user_id = $1 AND payment_customer_ref IS NULL
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(customer_ref)
    .bind(now)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}
