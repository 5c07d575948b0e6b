use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{extraction::TicketDetails, keywords::IssueCategory};

/// Documents the driver asks the authority to disclose.
pub const EVIDENCE_REQUESTS: [&str; 5] = [
    "All photographs taken by the civil enforcement officer, with timestamps",
    "The civil enforcement officer's contemporaneous notes and handheld device log",
    "A copy of the Traffic Management Order relied upon for this location",
    "Photographs and maintenance records of the signage and road markings in force on the date",
    "Calibration and maintenance records for any payment machine at the location",
];

pub const SUBMISSION_ADVICE: &str = "Submit this challenge within 14 days of the date of the notice. \
Challenging inside that window normally keeps the discounted rate open if the appeal is rejected, \
and the authority must put the penalty on hold while it considers your representations.";

const GENERAL_GROUND: &str = "I challenge the legal basis of this Penalty Charge Notice. \
I do not accept that a contravention occurred and I ask the authority to prove every element of it, \
including that the restriction was lawfully made, correctly signed and properly enforced.";

fn ground_for(category: IssueCategory) -> &'static str {
    match category {
        IssueCategory::Signage => {
            "The signage at the location was inadequate. Signs must clearly convey the restriction \
             to a driver, and the signs here were unclear, obscured or not visible from where I parked. \
             Where a restriction is not adequately signed it cannot be enforced."
        }
        IssueCategory::Timing => {
            "The timing of this notice is disputed. The observation period recorded does not show \
             that the vehicle overstayed, and the statutory grace period was not allowed before \
             the notice was issued."
        }
        IssueCategory::PaymentSystem => {
            "I was unable to pay because the payment system at the location was not working. \
             A driver cannot be penalised for failing to pay when the authority's own means of \
             payment was out of order and no working alternative was signed."
        }
        IssueCategory::Accessibility => {
            "The vehicle was being used by a disabled person. The authority must consider the \
             accessibility needs of the driver and any Blue Badge concessions that applied at the \
             time of the alleged contravention."
        }
        IssueCategory::LoadingExemption => {
            "The vehicle was engaged in loading or unloading, which is an exempt activity at this \
             location. Loading was continuous throughout the period observed and the exemption applies."
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Preamble,
    Date,
    Salutation,
    Ground,
    Statement,
    EvidenceRequest,
    SubmissionTiming,
    Closing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LetterSection {
    pub kind: SectionKind,
    /// Issue label for grounds; `None` elsewhere and for the general ground.
    pub issue: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppealLetter {
    pub sections: Vec<LetterSection>,
}

/// Inputs to the letter that are not derived from the driver's text.
#[derive(Debug, Clone, Default)]
pub struct LetterContext {
    pub date: Option<NaiveDate>,
    pub sender_name: Option<String>,
    pub number_plate: Option<String>,
    pub ticket: Option<TicketDetails>,
}

impl AppealLetter {
    pub fn sections_of(&self, kind: SectionKind) -> impl Iterator<Item = &LetterSection> {
        self.sections.iter().filter(move |s| s.kind == kind)
    }

    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.body.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn section(kind: SectionKind, body: impl Into<String>) -> LetterSection {
    LetterSection {
        kind,
        issue: None,
        body: body.into(),
    }
}

fn reference_line(ctx: &LetterContext) -> String {
    let ticket = ctx.ticket.as_ref().filter(|t| t.is_detected());
    let pcn = ticket
        .map(|t| t.pcn_number.as_str())
        .unwrap_or("[PCN number]");
    let plate = ctx
        .number_plate
        .as_deref()
        .or_else(|| ticket.map(|t| t.number_plate.as_str()))
        .unwrap_or("[vehicle registration]");

    let mut line = format!("Re: Penalty Charge Notice {} - Vehicle {}", pcn, plate);
    if let Some(t) = ticket {
        line.push_str(&format!("\nIssued by {} at {} on {}", t.council, t.location, t.date));
    }
    line
}

/// Builds the letter. Deterministic: identical inputs give identical output.
pub fn compose_letter(
    categories: &BTreeSet<IssueCategory>,
    text: &str,
    ctx: &LetterContext,
) -> AppealLetter {
    let mut sections = vec![
        section(
            SectionKind::Preamble,
            format!("To the Parking Services Department\n{}", reference_line(ctx)),
        ),
        section(
            SectionKind::Date,
            ctx.date
                .map(|d| d.format("%d %B %Y").to_string())
                .unwrap_or_else(|| "[date]".to_string()),
        ),
        section(SectionKind::Salutation, "Dear Sir or Madam,"),
    ];

    if categories.is_empty() {
        sections.push(section(SectionKind::Ground, GENERAL_GROUND));
    } else {
        for category in categories {
            sections.push(LetterSection {
                kind: SectionKind::Ground,
                issue: Some(category.label().to_string()),
                body: ground_for(*category).to_string(),
            });
        }
    }

    let statement = text.trim();
    if !statement.is_empty() {
        sections.push(section(
            SectionKind::Statement,
            format!("My account of what happened: \"{}\"", statement),
        ));
    }

    let evidence = EVIDENCE_REQUESTS
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n");
    sections.push(section(
        SectionKind::EvidenceRequest,
        format!(
            "Please provide the following so that I can consider my position:\n{}",
            evidence
        ),
    ));
    sections.push(section(SectionKind::SubmissionTiming, SUBMISSION_ADVICE));

    let signature = ctx.sender_name.as_deref().unwrap_or("[your name]");
    sections.push(section(
        SectionKind::Closing,
        format!(
            "I ask that this Penalty Charge Notice be cancelled. If the authority rejects this \
             challenge, please give full reasons and tell me how to appeal to the independent \
             adjudicator.\n\nYours faithfully,\n{}",
            signature
        ),
    ));

    AppealLetter { sections }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> LetterContext {
        LetterContext {
            date: NaiveDate::from_ymd_opt(2026, 10, 19),
            sender_name: Some("Sam Driver".to_string()),
            number_plate: Some("AB12CDE".to_string()),
            ticket: None,
        }
    }

    #[test]
    fn one_ground_per_category() {
        let categories = BTreeSet::from([IssueCategory::Signage, IssueCategory::PaymentSystem]);
        let letter = compose_letter(&categories, "broken meter and hidden sign", &ctx());
        let issues: Vec<_> = letter
            .sections_of(SectionKind::Ground)
            .filter_map(|s| s.issue.clone())
            .collect();
        assert_eq!(issues, vec!["signage", "payment-system"]);
    }

    #[test]
    fn falls_back_to_general_ground() {
        let letter = compose_letter(&BTreeSet::new(), "I parked", &ctx());
        let grounds: Vec<_> = letter.sections_of(SectionKind::Ground).collect();
        assert_eq!(grounds.len(), 1);
        assert!(grounds[0].issue.is_none());
        assert!(grounds[0].body.contains("legal basis"));
    }

    #[test]
    fn always_requests_evidence_and_advises_on_timing() {
        let letter = compose_letter(&BTreeSet::new(), "", &LetterContext::default());
        let evidence = letter.sections_of(SectionKind::EvidenceRequest).next().unwrap();
        assert!(evidence.body.lines().filter(|l| l.starts_with("- ")).count() >= 4);
        assert_eq!(letter.sections_of(SectionKind::SubmissionTiming).count(), 1);
        assert_eq!(letter.sections_of(SectionKind::Statement).count(), 0);
    }

    #[test]
    fn is_deterministic() {
        let categories = BTreeSet::from([IssueCategory::Accessibility]);
        let a = compose_letter(&categories, "wheelchair user", &ctx());
        let b = compose_letter(&categories, "wheelchair user", &ctx());
        assert_eq!(a, b);
        let rendered = a.render();
        assert!(rendered.contains("19 October 2026"));
        assert!(rendered.contains("Vehicle AB12CDE"));
        assert!(rendered.ends_with("Sam Driver"));
    }

    #[test]
    fn uses_detected_ticket_details() {
        let mut context = ctx();
        context.number_plate = None;
        context.ticket = Some(TicketDetails {
            number_plate: "XY99ZZZ".to_string(),
            pcn_number: "WK12345678".to_string(),
            amount: 7000,
            date: "01/10/2026".to_string(),
            location: "High Street".to_string(),
            contravention: "Parked in a restricted street".to_string(),
            council: "Camden".to_string(),
            payment_due_date: "29/10/2026".to_string(),
        });
        let letter = compose_letter(&BTreeSet::new(), "", &context);
        let preamble = &letter.sections[0].body;
        assert!(preamble.contains("Penalty Charge Notice WK12345678 - Vehicle XY99ZZZ"));
        assert!(preamble.contains("Issued by Camden at High Street"));
    }
}
