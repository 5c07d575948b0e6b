//! Heuristic compliance analysis of a driver's account of a parking ticket.
//!
//! Everything here is pure: the same text always yields the same issues,
//! score and letter. Gating and persistence live elsewhere.

pub mod extraction;
pub mod keywords;
pub mod letter;
pub mod pipeline;
pub mod score;

pub use extraction::{NOT_DETECTED, TicketDetails, extract_ticket, prose_outside_json};
pub use keywords::{GENERAL_REVIEW, IssueCategory, display_labels, match_categories};
pub use letter::{AppealLetter, LetterContext, LetterSection, SectionKind, compose_letter};
pub use pipeline::{Analysis, analyze, generate_appeal};
pub use score::{MAX_PROBABILITY, ScoreComponent, success_probability};
