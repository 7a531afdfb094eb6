//! User-facing description of a validation result.

use serde::Serialize;

use crate::models::ValidationResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// Title and message to show for a validation result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutcomeDescription {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl OutcomeDescription {
    fn new(severity: Severity, title: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.to_string(),
            message: message.into(),
        }
    }
}

struct Rule {
    matches: fn(&ValidationResult) -> bool,
    describe: fn(&ValidationResult) -> OutcomeDescription,
}

const DEFAULT_ERROR_MESSAGE: &str =
    "We couldn't verify this address. Please check it and try again.";

/// Evaluated top to bottom, first match wins.
const RULES: [Rule; 4] = [
    Rule {
        matches: |r| r.is_valid,
        describe: |_| {
            OutcomeDescription::new(
                Severity::Success,
                "Address verified",
                "This address was confirmed by the postal service.",
            )
        },
    },
    Rule {
        matches: |r| r.needs_secondary_address,
        describe: |_| {
            OutcomeDescription::new(
                Severity::Warning,
                "Apartment or suite needed",
                "This building has multiple units. Please add your apartment, suite, or unit number.",
            )
        },
    },
    Rule {
        matches: |r| r.secondary_address_invalid,
        describe: |_| {
            OutcomeDescription::new(
                Severity::Warning,
                "Unit number not recognized",
                "The street address is valid, but the apartment or suite number wasn't found. Please double-check it.",
            )
        },
    },
    Rule {
        matches: |r| r.is_vacant,
        describe: |_| {
            OutcomeDescription::new(
                Severity::Warning,
                "Address may be vacant",
                "The postal service lists this address as vacant. Please confirm it's correct.",
            )
        },
    },
];

/// Describe a validation result for display.
///
/// Rules are checked in order: valid, needs secondary, secondary invalid,
/// vacant. Anything else is an error using the result's own message when it
/// has one.
pub fn describe_outcome(result: &ValidationResult) -> OutcomeDescription {
    RULES
        .iter()
        .find(|rule| (rule.matches)(result))
        .map(|rule| (rule.describe)(result))
        .unwrap_or_else(|| {
            OutcomeDescription::new(
                Severity::Error,
                "Address not verified",
                result
                    .error
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
            )
        })
}
