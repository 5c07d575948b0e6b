use std::{collections::BTreeSet, fmt};

use serde::{Serialize, Serializer};

/// Procedural weaknesses a driver's account can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IssueCategory {
    Signage,
    Timing,
    PaymentSystem,
    Accessibility,
    LoadingExemption,
}

/// Label shown when nothing specific matched. Never stored as a category.
pub const GENERAL_REVIEW: &str = "general-review";

const RULES: &[(IssueCategory, &[&str])] = &[
    (
        IssueCategory::Signage,
        &[
            "sign",
            "unclear",
            "visible",
            "obscured",
            "faded",
            "hidden",
            "road marking",
            "yellow line",
        ],
    ),
    (
        IssueCategory::Timing,
        &[
            "on time",
            "time limit",
            "minute",
            "grace period",
            "clock",
            "hours",
            "expired",
            "overstay",
        ],
    ),
    (
        IssueCategory::PaymentSystem,
        &[
            "pay",
            "meter",
            "machine",
            "card reader",
            "out of order",
            "broken",
            "coins",
        ],
    ),
    (
        IssueCategory::Accessibility,
        &[
            "disab",
            "blue badge",
            "wheelchair",
            "mobility",
            "accessib",
        ],
    ),
    (
        IssueCategory::LoadingExemption,
        &[
            "loading",
            "unloading",
            "delivery",
            "delivering",
            "goods",
        ],
    ),
];

impl IssueCategory {
    pub const ALL: [IssueCategory; 5] = [
        IssueCategory::Signage,
        IssueCategory::Timing,
        IssueCategory::PaymentSystem,
        IssueCategory::Accessibility,
        IssueCategory::LoadingExemption,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            IssueCategory::Signage => "signage",
            IssueCategory::Timing => "timing",
            IssueCategory::PaymentSystem => "payment-system",
            IssueCategory::Accessibility => "accessibility",
            IssueCategory::LoadingExemption => "loading-exemption",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        RULES
            .iter()
            .find(|(category, _)| category == self)
            .map(|(_, keywords)| *keywords)
            .unwrap_or(&[])
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for IssueCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Case-insensitive substring match of `text` against every category's
/// keyword list. All categories that fire are returned.
pub fn match_categories(text: &str) -> BTreeSet<IssueCategory> {
    let lowered = text.to_lowercase();
    RULES
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(category, _)| *category)
        .collect()
}

/// Display labels for a match set, falling back to [`GENERAL_REVIEW`].
pub fn display_labels(categories: &BTreeSet<IssueCategory>) -> Vec<String> {
    if categories.is_empty() {
        return vec![GENERAL_REVIEW.to_string()];
    }
    categories.iter().map(|c| c.label().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obscured_sign_is_signage_only() {
        let found = match_categories("The sign was completely unclear and obscured by a tree");
        assert_eq!(found, BTreeSet::from([IssueCategory::Signage]));
    }

    #[test]
    fn matching_ignores_case() {
        let found = match_categories("PAY AND DISPLAY MACHINE WAS BROKEN");
        assert_eq!(found, BTreeSet::from([IssueCategory::PaymentSystem]));
    }

    #[test]
    fn categories_are_not_exclusive() {
        let found = match_categories(
            "I was unloading goods for a delivery with my blue badge displayed, the meter was out of order",
        );
        assert!(found.contains(&IssueCategory::LoadingExemption));
        assert!(found.contains(&IssueCategory::Accessibility));
        assert!(found.contains(&IssueCategory::PaymentSystem));
    }

    #[test]
    fn timing_needs_a_timing_phrase() {
        let found = match_categories("Sometimes I use the hourly car park");
        assert!(found.is_empty());

        let found = match_categories("I returned ten minutes after the time limit");
        assert_eq!(found, BTreeSet::from([IssueCategory::Timing]));
    }

    #[test]
    fn nothing_matches_plain_text() {
        let found = match_categories("I parked the car outside my friend's house");
        assert!(found.is_empty());
        assert_eq!(display_labels(&found), vec![GENERAL_REVIEW.to_string()]);
    }

    #[test]
    fn empty_only_when_no_keyword_appears() {
        for category in IssueCategory::ALL {
            for keyword in category.keywords() {
                let found = match_categories(&format!("xx {} xx", keyword.to_uppercase()));
                assert!(found.contains(&category), "{keyword} should fire {category}");
            }
        }
    }

    #[test]
    fn labels_round_trip() {
        for category in IssueCategory::ALL {
            assert_eq!(IssueCategory::from_label(category.label()), Some(category));
        }
        assert_eq!(IssueCategory::from_label(GENERAL_REVIEW), None);
    }
}
