//! Postal validation request and result models.

use serde::{Deserialize, Serialize};

/// Structured address submitted for postal validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub street_address: String,

    /// Unit, apartment or suite (e.g., "Apt 4B").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_address: Option<String>,

    pub city: String,

    pub state: String,

    pub zip_code: String,
}

impl ValidationRequest {
    pub fn new(
        street_address: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip_code: impl Into<String>,
    ) -> Self {
        Self {
            street_address: street_address.into(),
            secondary_address: None,
            city: city.into(),
            state: state.into(),
            zip_code: zip_code.into(),
        }
    }

    /// Set the unit/suite line. Blank values are dropped.
    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        let secondary = secondary.into();
        self.secondary_address = if secondary.trim().is_empty() {
            None
        } else {
            Some(secondary)
        };
        self
    }
}

/// Address as standardized by the postal backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardizedAddress {
    pub street_address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_address: Option<String>,

    pub city: String,

    pub state: String,

    /// Five-digit ZIP.
    pub zip_code: String,

    /// Four-digit ZIP+4 extension, when the backend supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_plus4: Option<String>,
}

impl StandardizedAddress {
    /// ZIP rendered as `12345-6789`, or just the five digits.
    pub fn full_zip(&self) -> String {
        match &self.zip_plus4 {
            Some(zip4) => format!("{}-{}", self.zip_code, zip4),
            None => self.zip_code.clone(),
        }
    }

    /// One-line rendering: `street[ unit], city, state zip`.
    pub fn single_line(&self) -> String {
        let street = match &self.secondary_address {
            Some(unit) => format!("{} {}", self.street_address, unit),
            None => self.street_address.clone(),
        };
        format!("{}, {}, {} {}", street, self.city, self.state, self.full_zip())
    }
}

/// Delivery-point confirmation code reported by the postal backend.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum ConfirmationCode {
    /// Primary and secondary matched.
    #[serde(rename = "Y")]
    Confirmed,
    /// Primary matched, secondary missing.
    #[serde(rename = "D")]
    SecondaryMissing,
    /// Primary matched, secondary present but not recognized.
    #[serde(rename = "S")]
    SecondaryInvalid,
    /// No match.
    #[serde(rename = "N")]
    NotFound,
    /// Absent or unrecognized code.
    #[default]
    #[serde(rename = "")]
    Unknown,
}

impl ConfirmationCode {
    /// Parse the raw backend value; anything unrecognized is `Unknown`.
    pub fn from_code(raw: &str) -> Self {
        match raw.trim() {
            "Y" => Self::Confirmed,
            "D" => Self::SecondaryMissing,
            "S" => Self::SecondaryInvalid,
            "N" => Self::NotFound,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "Y",
            Self::SecondaryMissing => "D",
            Self::SecondaryInvalid => "S",
            Self::NotFound => "N",
            Self::Unknown => "",
        }
    }
}

/// Classified postal validation outcome.
///
/// `is_valid`, `needs_secondary_address`, `secondary_address_invalid` and
/// the not-found/error path are mutually exclusive: at most one of the
/// three flags is set, and none is set when `error` is present.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,

    pub needs_secondary_address: bool,

    pub secondary_address_invalid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standardized_address: Option<StandardizedAddress>,

    pub confirmation_code: ConfirmationCode,

    /// Raw footnote codes from the backend, concatenated.
    pub footnotes: String,

    pub is_vacant: bool,

    pub is_business: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Message used when the backend reports no match.
pub const NOT_FOUND_MESSAGE: &str =
    "Address not found. Please check the street, city, and ZIP code and try again.";

impl ValidationResult {
    /// Result for a backend "not found" (HTTP 404 or code `N`).
    pub fn not_found() -> Self {
        Self {
            confirmation_code: ConfirmationCode::NotFound,
            error: Some(NOT_FOUND_MESSAGE.to_string()),
            ..Self::default()
        }
    }

    /// Generic failure carrying a human-readable message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// City and state returned by a ZIP lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityState {
    pub city: String,
    pub state: String,
}
