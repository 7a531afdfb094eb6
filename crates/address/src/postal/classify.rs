//! Turns a successful USPS address response into a [`ValidationResult`].
//!
//! The confirmation code decides the outcome. Footnote heuristics are only
//! consulted when the code is missing or unrecognized:
//!
//! | Code      | Outcome                                              |
//! |-----------|------------------------------------------------------|
//! | `Y`       | valid                                                |
//! | `D`       | needs secondary address                              |
//! | `S`       | secondary address invalid                            |
//! | `N`       | not found, `error` set                               |
//! | (unknown) | `N1`/`C1` needs secondary, else `CC` secondary invalid, else unconfirmed with `error` set |
//!
//! At most one outcome flag is ever set.

use crate::models::{
    ConfirmationCode, StandardizedAddress, ValidationRequest, ValidationResult, NOT_FOUND_MESSAGE,
};

use super::models::{is_yes, AddressResponse, UspsAddress};

/// Footnotes meaning the address needs a unit number.
const NEEDS_SECONDARY_FOOTNOTES: [&str; 2] = ["N1", "C1"];

/// Footnote meaning the supplied unit number was not recognized.
const SECONDARY_INVALID_FOOTNOTE: &str = "CC";

pub(crate) const UNCONFIRMED_MESSAGE: &str =
    "The postal service could not confirm this address. Please double-check it.";

pub(crate) fn classify(response: AddressResponse, request: &ValidationRequest) -> ValidationResult {
    let footnotes = response.footnotes();
    let info = response.additional_info.unwrap_or_default();
    let code = ConfirmationCode::from_code(info.dpv_confirmation.as_deref().unwrap_or_default());

    let mut result = ValidationResult {
        standardized_address: Some(standardize(response.address.unwrap_or_default(), request)),
        confirmation_code: code,
        is_vacant: is_yes(info.vacant.as_deref()),
        is_business: is_yes(info.business.as_deref()),
        ..ValidationResult::default()
    };

    match code {
        ConfirmationCode::Confirmed => result.is_valid = true,
        ConfirmationCode::SecondaryMissing => result.needs_secondary_address = true,
        ConfirmationCode::SecondaryInvalid => result.secondary_address_invalid = true,
        ConfirmationCode::NotFound => result.error = Some(NOT_FOUND_MESSAGE.to_string()),
        ConfirmationCode::Unknown => {
            if NEEDS_SECONDARY_FOOTNOTES
                .iter()
                .any(|note| footnotes.contains(note))
            {
                result.needs_secondary_address = true;
            } else if footnotes.contains(SECONDARY_INVALID_FOOTNOTE) {
                result.secondary_address_invalid = true;
            } else {
                result.error = Some(UNCONFIRMED_MESSAGE.to_string());
            }
        }
    }

    result.footnotes = footnotes;
    result
}

/// Echoed fields win; blanks fall back to what the caller submitted, except
/// the unit line and ZIP+4 which are only kept when USPS returned them.
fn standardize(address: UspsAddress, request: &ValidationRequest) -> StandardizedAddress {
    StandardizedAddress {
        street_address: non_blank(address.street_address)
            .unwrap_or_else(|| request.street_address.trim().to_string()),
        secondary_address: non_blank(address.secondary_address),
        city: non_blank(address.city).unwrap_or_else(|| request.city.trim().to_string()),
        state: non_blank(address.state).unwrap_or_else(|| request.state.trim().to_string()),
        zip_code: non_blank(address.zip_code).unwrap_or_else(|| request.zip_code.trim().to_string()),
        zip_plus4: non_blank(address.zip_plus4),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
