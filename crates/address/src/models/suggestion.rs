//! Candidate addresses returned by geocoding.

use serde::{Deserialize, Serialize};

use super::ValidationRequest;

/// Which geocoding backend produced a result.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// The free OpenStreetMap-based service, tried first by default.
    Primary,
    /// The commercial fallback, only used when an API key is configured.
    Secondary,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Primary, ProviderKind::Secondary];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate address returned by a geocoding backend.
///
/// Coordinates are always present. The structured parts are empty strings
/// when the backend omitted them, never absent, so downstream formatting
/// stays total.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSuggestion {
    /// Backend-specific opaque identifier (e.g., an OSM place id).
    pub id: String,

    /// Full human-readable address.
    pub display_name: String,

    /// House number and street (e.g., "123 Main St").
    pub street_address: String,

    pub city: String,

    pub state: String,

    pub zip: String,

    /// WGS84 latitude.
    pub latitude: f64,

    /// WGS84 longitude.
    pub longitude: f64,

    /// Free-form category from the backend (e.g., "house", "commercial").
    pub place_type: String,

    pub provider: ProviderKind,
}

impl AddressSuggestion {
    /// Convert a chosen suggestion into a postal validation request.
    pub fn to_validation_request(&self) -> ValidationRequest {
        ValidationRequest {
            street_address: self.street_address.clone(),
            secondary_address: None,
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip.clone(),
        }
    }
}

/// Join a house number and road into a street line, tolerating either part
/// being absent.
pub(crate) fn join_street(house_number: Option<&str>, road: Option<&str>) -> String {
    let parts: Vec<&str> = [house_number, road]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    parts.join(" ")
}
