use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{UnknownVariant, entitlement::EntitlementRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppealStatus {
    Draft,
    Submitted,
    UnderReview,
    Accepted,
    Rejected,
    Withdrawn,
}

impl AppealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppealStatus::Draft => "draft",
            AppealStatus::Submitted => "submitted",
            AppealStatus::UnderReview => "under_review",
            AppealStatus::Accepted => "accepted",
            AppealStatus::Rejected => "rejected",
            AppealStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppealStatus::Accepted | AppealStatus::Rejected | AppealStatus::Withdrawn
        )
    }

    /// Forward-only: draft -> submitted -> under_review -> accepted | rejected,
    /// with withdrawal allowed from any open state.
    pub fn can_transition_to(&self, next: AppealStatus) -> bool {
        use AppealStatus::*;
        matches!(
            (self, next),
            (Draft, Submitted)
                | (Submitted, UnderReview)
                | (UnderReview, Accepted)
                | (UnderReview, Rejected)
                | (Draft | Submitted | UnderReview, Withdrawn)
        )
    }
}

impl fmt::Display for AppealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppealStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(AppealStatus::Draft),
            "submitted" => Ok(AppealStatus::Submitted),
            "under_review" => Ok(AppealStatus::UnderReview),
            "accepted" => Ok(AppealStatus::Accepted),
            "rejected" => Ok(AppealStatus::Rejected),
            "withdrawn" => Ok(AppealStatus::Withdrawn),
            other => Err(UnknownVariant::new("appeal status", other)),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct AppealRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub number_plate: String,
    pub ticket_value: i64,
    pub source_text: String,
    pub letter_content: Option<String>,
    pub status: String,
    pub issues: Vec<String>,
    pub success_probability: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A generated appeal. `issues` and `success_probability` are fixed at
/// creation; `letter_content` is absent for analysis-only drafts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppealRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub number_plate: String,
    pub ticket_value: i64,
    pub source_text: String,
    pub letter_content: Option<String>,
    pub status: AppealStatus,
    pub issues: Vec<String>,
    pub success_probability: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AppealRow> for AppealRecord {
    type Error = UnknownVariant;

    fn try_from(row: AppealRow) -> Result<Self, Self::Error> {
        Ok(AppealRecord {
            status: row.status.parse()?,
            id: row.id,
            user_id: row.user_id,
            number_plate: row.number_plate,
            ticket_value: row.ticket_value,
            source_text: row.source_text,
            letter_content: row.letter_content,
            issues: row.issues,
            success_probability: row.success_probability,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Result of attaching a letter and charging for it in one write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LetterCharge {
    Charged {
        appeal: AppealRecord,
        entitlement: EntitlementRecord,
    },
    /// The appeal already had a letter; nothing was charged.
    AlreadyAttached,
    /// The chosen allowance was gone; the letter was not stored.
    AllowanceUsed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_only_move_forward() {
        use AppealStatus::*;
        assert!(Draft.can_transition_to(Submitted));
        assert!(Submitted.can_transition_to(UnderReview));
        assert!(UnderReview.can_transition_to(Accepted));
        assert!(UnderReview.can_transition_to(Rejected));
        assert!(Submitted.can_transition_to(Withdrawn));

        assert!(!Submitted.can_transition_to(Draft));
        assert!(!Draft.can_transition_to(Accepted));
        assert!(!Accepted.can_transition_to(Withdrawn));
        assert!(!Rejected.can_transition_to(UnderReview));
        assert!(!Draft.can_transition_to(Draft));
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            AppealStatus::Draft,
            AppealStatus::Submitted,
            AppealStatus::UnderReview,
            AppealStatus::Accepted,
            AppealStatus::Rejected,
            AppealStatus::Withdrawn,
        ] {
            assert_eq!(status.as_str().parse::<AppealStatus>().unwrap(), status);
        }
        assert!("pending".parse::<AppealStatus>().is_err());
    }
}
