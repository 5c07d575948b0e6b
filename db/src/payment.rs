use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    dtos::payment::NewPayment,
    models::payment::{PaymentRecord, PaymentRow},
};

fn into_record(row: PaymentRow) -> Res<PaymentRecord> {
    PaymentRecord::try_from(row).map_err(AppError::from)
}

pub async fn insert_payment<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: NewPayment,
    now: DateTime<Utc>,
) -> Res<PaymentRecord> {
    let row = sqlx::query_as::<_, PaymentRow>(
        r#"
        INSERT INTO payments (id, user_id, intent_id, payment_type, amount, currency, status, appeal_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(data.user_id)
    .bind(data.intent_id)
    .bind(data.payment_type.as_str())
    .bind(data.amount)
    .bind(data.currency)
    .bind(data.status.as_str())
    .bind(data.appeal_id)
    .bind(now)
    .fetch_one(executor)
    .await?;

    into_record(row)
}

/// Records a terminal status for the intent, creating the row if it was never
/// recorded. A failed payment may still succeed later; a succeeded one is
/// final. Returns `None` for a repeated status or anything after success, so
/// redelivered events change nothing.
pub async fn settle_payment<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: NewPayment,
    now: DateTime<Utc>,
) -> Res<Option<PaymentRecord>> {
    sqlx::query_as::<_, PaymentRow>(
        r#"
        INSERT INTO payments (id, user_id, intent_id, payment_type, amount, currency, status, appeal_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
        ON CONFLICT (intent_id) DO UPDATE SET
            status = EXCLUDED.status,
            updated_at = EXCLUDED.updated_at
        WHERE payments.status <> 'succeeded' AND payments.status <> EXCLUDED.status
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(data.user_id)
    .bind(data.intent_id)
    .bind(data.payment_type.as_str())
    .bind(data.amount)
    .bind(data.currency)
    .bind(data.status.as_str())
    .bind(data.appeal_id)
    .bind(now)
    .fetch_optional(executor)
    .await?
    .map(into_record)
    .transpose()
}

/// Newest first.
pub async fn list_payments<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &Uuid,
) -> Res<Vec<PaymentRecord>> {
    sqlx::query_as::<_, PaymentRow>(
        "SELECT * FROM payments WHERE user_id = $1 ORDER BY created_at DESC, id",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?
    .into_iter()
    .map(into_record)
    .collect()
}
