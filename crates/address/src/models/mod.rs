//! Address models
//!
//! This module contains the core data types for address operations:
//! - `suggestion` - Geocoding candidates (AddressSuggestion) and backend identity (ProviderKind)
//! - `validation` - Postal validation request/result types
//! - `bounds` - Metro bounding box used to bias searches

mod bounds;
mod suggestion;
mod validation;

pub use bounds::{is_valid_coordinate, BoundingBox};
pub use suggestion::{AddressSuggestion, ProviderKind};
pub use validation::{
    CityState, ConfirmationCode, StandardizedAddress, ValidationRequest, ValidationResult,
    NOT_FOUND_MESSAGE,
};

pub(crate) use suggestion::join_street;
