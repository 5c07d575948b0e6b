use common::{env_config::PricingConfig, error::Res};
use db::models::{
    appeal::{AppealRecord, AppealStatus},
    entitlement::EntitlementRecord,
};
use ledger::Ledger;

use crate::dtos::usage::{DashboardStats, Prices, UsageResponse};

pub fn dashboard_stats(appeals: &[AppealRecord]) -> DashboardStats {
    appeals
        .iter()
        .fold(DashboardStats::default(), |mut stats, appeal| {
            stats.total_ticket_value += appeal.ticket_value;
            match appeal.status {
                AppealStatus::Accepted => {
                    stats.accepted += 1;
                    stats.total_savings += appeal.ticket_value;
                }
                AppealStatus::Rejected => stats.rejected += 1,
                AppealStatus::Withdrawn => stats.withdrawn += 1,
                AppealStatus::Draft | AppealStatus::Submitted | AppealStatus::UnderReview => {
                    stats.pending += 1
                }
            }
            stats
        })
}

pub async fn usage(
    ledger: &Ledger,
    record: EntitlementRecord,
    pricing: &PricingConfig,
) -> Res<UsageResponse> {
    let appeals = ledger.store().list_appeals(record.user_id).await?;

    Ok(UsageResponse {
        has_free_appeal_available: record.free_appeals_used == 0,
        free_appeals_used: record.free_appeals_used,
        paid_appeals_used: record.paid_appeals_used,
        total_appeals_created: record.total_appeals_created,
        paid_appeal_credits: record.paid_appeal_credits,
        vehicle_change_credits: record.vehicle_change_credits,
        vehicles_registered: usize::from(record.vehicle_registration.is_some()),
        vehicle_registration: record.vehicle_registration,
        last_free_appeal_reset: record.last_free_appeal_reset,
        prices: Prices {
            currency: pricing.currency.clone(),
            additional_appeal: pricing.additional_appeal,
            vehicle_addition: pricing.vehicle_addition,
        },
        stats: dashboard_stats(&appeals),
    })
}
