use std::collections::BTreeSet;

use serde::Serialize;

use crate::{
    keywords::{IssueCategory, display_labels, match_categories},
    letter::{AppealLetter, LetterContext, compose_letter},
    score::{ScoreComponent, probability_from, score_components},
};

/// The free artifact: what was found and how promising it looks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub categories: BTreeSet<IssueCategory>,
    /// Display labels; `general-review` when no category matched.
    pub issues: Vec<String>,
    pub probability: u8,
    pub components: Vec<ScoreComponent>,
    pub summary: String,
}

fn summarise(categories: &BTreeSet<IssueCategory>, probability: u8) -> String {
    let findings = if categories.is_empty() {
        "No specific compliance issue stood out, so the appeal would challenge the legal basis \
         of the notice in general terms."
            .to_string()
    } else {
        let labels: Vec<&str> = categories.iter().map(|c| c.label()).collect();
        format!(
            "Potential compliance issues found: {}.",
            labels.join(", ")
        )
    };
    format!(
        "{} Estimated chance of a successful appeal: {}%.",
        findings, probability
    )
}

/// Keyword matching and scoring only. Free for every caller.
pub fn analyze(text: &str) -> Analysis {
    let categories = match_categories(text);
    let components = score_components(&categories, text);
    let probability = probability_from(&components);
    Analysis {
        issues: display_labels(&categories),
        summary: summarise(&categories, probability),
        categories,
        probability,
        components,
    }
}

/// The gated artifact. Callers decide whether the user may have it.
pub fn generate_appeal(text: &str, ctx: &LetterContext) -> AppealLetter {
    compose_letter(&match_categories(text), text, ctx)
}
