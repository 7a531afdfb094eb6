//! USPS Addresses 3.0 API request and response structures.

use serde::Deserialize;

/// `POST /oauth2/v3/token` response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// `GET /addresses/v3/address` response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AddressResponse {
    #[serde(default)]
    pub address: Option<UspsAddress>,
    #[serde(default, rename = "additionalInfo")]
    pub additional_info: Option<AdditionalInfo>,
    #[serde(default)]
    pub corrections: Vec<CodedMessage>,
    #[serde(default)]
    pub matches: Vec<CodedMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UspsAddress {
    #[serde(default, rename = "streetAddress")]
    pub street_address: Option<String>,
    #[serde(default, rename = "secondaryAddress")]
    pub secondary_address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, rename = "ZIPCode")]
    pub zip_code: Option<String>,
    #[serde(default, rename = "ZIPPlus4")]
    pub zip_plus4: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AdditionalInfo {
    #[serde(default, rename = "DPVConfirmation")]
    pub dpv_confirmation: Option<String>,
    #[serde(default, rename = "DPVFootnotes")]
    pub dpv_footnotes: Option<String>,
    /// "Y" or "N".
    #[serde(default)]
    pub business: Option<String>,
    /// "Y" or "N".
    #[serde(default)]
    pub vacant: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CodedMessage {
    #[serde(default)]
    pub code: String,
}

/// `GET /addresses/v3/city-state` response.
#[derive(Debug, Deserialize)]
pub(crate) struct CityStateResponse {
    pub city: String,
    pub state: String,
}

/// Error envelope USPS returns with non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

impl AddressResponse {
    /// DPV footnotes followed by correction and match codes, space separated.
    pub fn footnotes(&self) -> String {
        let dpv = self
            .additional_info
            .as_ref()
            .and_then(|info| info.dpv_footnotes.as_deref());

        dpv.into_iter()
            .chain(self.corrections.iter().map(|c| c.code.as_str()))
            .chain(self.matches.iter().map(|m| m.code.as_str()))
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub(crate) fn is_yes(flag: Option<&str>) -> bool {
    flag.map(|value| value.trim().eq_ignore_ascii_case("Y"))
        .unwrap_or(false)
}
