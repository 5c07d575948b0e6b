use analysis::{LetterContext, analyze, generate_appeal};
use common::error::{AppError, Res};
use db::{
    dtos::appeal::NewAppeal,
    models::{appeal::AppealRecord, appeal::AppealStatus, entitlement::EntitlementRecord},
};
use ledger::{Action, Decision, Ledger, decide, normalize_plate};
use uuid::Uuid;

use crate::{
    dtos::appeal::{CreateAppealRequest, UnlockLetterRequest},
    services::analysis::require_text,
};

fn appeal_not_found() -> AppError {
    AppError::NotFound("Appeal not found".to_string())
}

/// Plate from the request, then the registered vehicle, then the ticket.
fn resolve_plate(req: &CreateAppealRequest, record: &EntitlementRecord) -> Res<String> {
    if let Some(plate) = req.number_plate.as_deref() {
        return normalize_plate(plate);
    }
    if let Some(plate) = record.vehicle_registration.clone() {
        return Ok(plate);
    }
    match req.ticket.as_ref().filter(|t| t.is_detected()) {
        Some(ticket) => normalize_plate(&ticket.number_plate),
        None => Err(AppError::BadRequest(
            "number_plate is required when no vehicle is registered".to_string(),
        )),
    }
}

fn resolve_ticket_value(req: &CreateAppealRequest) -> Res<i64> {
    let value = req
        .ticket_value
        .or_else(|| req.ticket.as_ref().map(|t| t.amount))
        .unwrap_or(0);
    if value < 0 {
        return Err(AppError::BadRequest(
            "ticket_value must not be negative".to_string(),
        ));
    }
    Ok(value)
}

/// Composes the letter, then stores it and charges the allowance the gate
/// picks in one write.
async fn charge_and_attach(
    ledger: &Ledger,
    appeal: &AppealRecord,
    mut ctx: LetterContext,
) -> Res<AppealRecord> {
    let record = ledger.get_entitlement(appeal.user_id).await?;
    let is_free = match decide(&record, Action::CreateAppeal) {
        Decision::AllowFree => true,
        Decision::Allow => false,
        Decision::RequirePayment(payment_type) => {
            return Err(AppError::payment_required(payment_type).with_appeal(appeal.id));
        }
    };

    ctx.date = Some(ledger.now().date_naive());
    ctx.number_plate = Some(appeal.number_plate.clone());
    if ctx.sender_name.is_none() {
        ctx.sender_name = record.display_name;
    }
    let letter = generate_appeal(&appeal.source_text, &ctx).render();

    match ledger
        .attach_letter_charged(appeal.user_id, appeal.id, is_free, &letter)
        .await?
    {
        Some((updated, _)) => Ok(updated),
        None => {
            log::warn!(
                "Letter for appeal {} was attached by a concurrent request",
                appeal.id
            );
            ledger
                .store()
                .get_appeal(appeal.user_id, appeal.id)
                .await?
                .ok_or_else(appeal_not_found)
        }
    }
}

/// Stores the analysis as a draft, then generates the letter if the gate
/// allows. A 402 carries the draft's id so it can be unlocked after payment.
pub async fn create_appeal(
    ledger: &Ledger,
    record: &EntitlementRecord,
    req: CreateAppealRequest,
) -> Res<AppealRecord> {
    let text = require_text(&req.text)?.to_string();
    let number_plate = resolve_plate(&req, record)?;
    let ticket_value = resolve_ticket_value(&req)?;
    let analysis = analyze(&text);

    let draft = ledger
        .store()
        .insert_appeal(
            NewAppeal {
                user_id: record.user_id,
                number_plate,
                ticket_value,
                source_text: text,
                issues: analysis.issues,
                success_probability: i16::from(analysis.probability),
            },
            ledger.now(),
        )
        .await?;

    let ctx = LetterContext {
        sender_name: req.sender_name,
        ticket: req.ticket,
        ..Default::default()
    };
    charge_and_attach(ledger, &draft, ctx).await
}

/// Generates the letter for an existing draft. Appeals that already have a
/// letter are returned as they are, without charging again.
pub async fn unlock_letter(
    ledger: &Ledger,
    user_id: Uuid,
    appeal_id: Uuid,
    req: UnlockLetterRequest,
) -> Res<AppealRecord> {
    let appeal = ledger
        .store()
        .get_appeal(user_id, appeal_id)
        .await?
        .ok_or_else(appeal_not_found)?;
    if appeal.letter_content.is_some() {
        return Ok(appeal);
    }

    let ctx = LetterContext {
        sender_name: req.sender_name,
        ..Default::default()
    };
    charge_and_attach(ledger, &appeal, ctx).await
}

pub async fn list_appeals(ledger: &Ledger, user_id: Uuid) -> Res<Vec<AppealRecord>> {
    ledger.store().list_appeals(user_id).await
}

pub async fn update_status(
    ledger: &Ledger,
    user_id: Uuid,
    appeal_id: Uuid,
    next: AppealStatus,
) -> Res<AppealRecord> {
    let appeal = ledger
        .store()
        .get_appeal(user_id, appeal_id)
        .await?
        .ok_or_else(appeal_not_found)?;

    if !appeal.status.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "Cannot move appeal from {} to {}",
            appeal.status, next
        )));
    }

    ledger
        .store()
        .update_appeal_status(user_id, appeal_id, appeal.status, next, ledger.now())
        .await?
        .ok_or_else(|| {
            AppError::BadRequest("Appeal status changed concurrently, retry".to_string())
        })
}
