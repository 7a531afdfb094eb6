//! Postal address validation.
//!
//! - `client` - USPS Addresses 3.0 client (validation and ZIP lookup)
//! - `credential_cache` - shared OAuth access token slot
//! - `classify` - response to [`ValidationResult`](crate::models::ValidationResult) rules
//! - `outcome` - ordered user-facing description of a result

mod classify;
mod client;
mod credential_cache;
mod models;
mod outcome;

pub use client::{ClientCredentials, PostalSettings, PostalValidationClient, DEFAULT_BASE_URL};
pub use credential_cache::{Credential, CredentialCache, REFRESH_MARGIN_SECONDS};
pub use outcome::{describe_outcome, OutcomeDescription, Severity};

pub(crate) use client::is_five_digit_zip;
