use std::collections::BTreeSet;

use serde::Serialize;

use crate::keywords::{IssueCategory, match_categories};

pub const BASE_PROBABILITY: u8 = 45;
/// Scores are clamped here; the estimate never claims certainty.
pub const MAX_PROBABILITY: u8 = 95;
pub const EMERGENCY_WEIGHT: u8 = 15;

/// Checked against the raw text, independently of the category set.
const EMERGENCY_KEYWORDS: &[&str] = &[
    "emergency",
    "medical",
    "hospital",
    "ambulance",
    "doctor",
    "a&e",
];

fn category_weight(category: IssueCategory) -> u8 {
    match category {
        IssueCategory::Signage => 25,
        IssueCategory::Accessibility => 20,
        IssueCategory::LoadingExemption => 15,
        IssueCategory::PaymentSystem => 10,
        IssueCategory::Timing => 0,
    }
}

/// One additive contribution to the estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreComponent {
    pub factor: String,
    pub weight: u8,
}

pub fn mentions_emergency(text: &str) -> bool {
    let lowered = text.to_lowercase();
    EMERGENCY_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Weighted contributions for a text whose categories are already known.
pub fn score_components(categories: &BTreeSet<IssueCategory>, text: &str) -> Vec<ScoreComponent> {
    let mut components: Vec<ScoreComponent> = categories
        .iter()
        .filter(|c| category_weight(**c) > 0)
        .map(|c| ScoreComponent {
            factor: c.label().to_string(),
            weight: category_weight(*c),
        })
        .collect();

    if mentions_emergency(text) {
        components.push(ScoreComponent {
            factor: "emergency".to_string(),
            weight: EMERGENCY_WEIGHT,
        });
    }
    components
}

/// Sums the base and every component, then clamps to [`MAX_PROBABILITY`].
pub fn probability_from(components: &[ScoreComponent]) -> u8 {
    let total: u32 = BASE_PROBABILITY as u32 + components.iter().map(|c| c.weight as u32).sum::<u32>();
    total.min(MAX_PROBABILITY as u32) as u8
}

/// Integer success estimate in `[45, 95]` for the given account.
pub fn success_probability(text: &str) -> u8 {
    probability_from(&score_components(&match_categories(text), text))
}
