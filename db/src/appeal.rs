use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    dtos::appeal::NewAppeal,
    models::appeal::{AppealRecord, AppealRow, AppealStatus},
};

fn into_record(row: AppealRow) -> Res<AppealRecord> {
    AppealRecord::try_from(row).map_err(AppError::from)
}

pub async fn insert_appeal<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: NewAppeal,
    now: DateTime<Utc>,
) -> Res<AppealRecord> {
    let row = sqlx::query_as::<_, AppealRow>(
        r#"
        INSERT INTO appeals (id, user_id, number_plate, ticket_value, source_text, status, issues, success_probability, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(data.user_id)
    .bind(data.number_plate)
    .bind(data.ticket_value)
    .bind(data.source_text)
    .bind(AppealStatus::Draft.as_str())
    .bind(data.issues)
    .bind(data.success_probability)
    .bind(now)
    .fetch_one(executor)
    .await?;

    into_record(row)
}

pub async fn get_appeal<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &Uuid,
    appeal_id: &Uuid,
) -> Res<Option<AppealRecord>> {
    sqlx::query_as::<_, AppealRow>("SELECT * FROM appeals WHERE id = $1 AND user_id = $2")
        .bind(appeal_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?
        .map(into_record)
        .transpose()
}

/// Newest first.
pub async fn list_appeals<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &Uuid,
) -> Res<Vec<AppealRecord>> {
    sqlx::query_as::<_, AppealRow>(
        "SELECT * FROM appeals WHERE user_id = $1 ORDER BY created_at DESC, id",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?
    .into_iter()
    .map(into_record)
    .collect()
}

/// Writes the letter once. `None` if the appeal is missing or already has one.
pub async fn attach_letter<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &Uuid,
    appeal_id: &Uuid,
    letter: &str,
    now: DateTime<Utc>,
) -> Res<Option<AppealRecord>> {
    sqlx::query_as::<_, AppealRow>(
        r#"
        UPDATE appeals SET letter_content = $3, updated_at = $4
        WHERE id = $1 AND user_id = $2 AND letter_content IS NULL
        RETURNING *
        "#,
    )
    .bind(appeal_id)
    .bind(user_id)
    .bind(letter)
    .bind(now)
    .fetch_optional(executor)
    .await?
    .map(into_record)
    .transpose()
}

/// Compare-and-set on the current status.
pub async fn update_appeal_status<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &Uuid,
    appeal_id: &Uuid,
    from: AppealStatus,
    to: AppealStatus,
    now: DateTime<Utc>,
) -> Res<Option<AppealRecord>> {
    sqlx::query_as::<_, AppealRow>(
        r#"
        UPDATE appeals SET status = $4, updated_at = $5
        WHERE id = $1 AND user_id = $2 AND status = $3
        RETURNING *
        "#,
    )
    .bind(appeal_id)
    .bind(user_id)
    .bind(from.as_str())
    .bind(to.as_str())
    .bind(now)
    .fetch_optional(executor)
    .await?
    .map(into_record)
    .transpose()
}
