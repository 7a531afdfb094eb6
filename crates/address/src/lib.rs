//! Locus Address Crate
//!
//! Address resolution and validation for checkout and location flows.
//!
//! # Overview
//!
//! The address crate supports:
//! - Autocomplete, forward and reverse geocoding against two backends
//!   (Nominatim primary, LocationIQ secondary) with health-biased failover
//! - USPS address validation and ZIP to city/state lookup behind a cached
//!   OAuth credential
//! - Classification of validation results into user-facing outcomes
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |  AddressEngine   |  (public entry point, deadlines, input guards)
//! +------------------+
//!      |          |
//!      v          v
//! +-----------+  +------------------------+
//! |  Gateway  |  | PostalValidationClient |
//! +-----------+  +------------------------+
//!   |  ^    |         |            |
//!   |  |    |         v            v
//!   |  | +----------+ +-----------------+ +----------+
//!   |  | | RateLim. | | CredentialCache | | classify |
//!   |  | +----------+ +-----------------+ +----------+
//!   |  |
//!   |  +-- HealthTracker (picks the order, records failures)
//!   v
//! +------------------------+
//! | Nominatim | LocationIQ |  (GeocodingProvider)
//! +------------------------+
//!              |
//!              v
//!      +---------------+
//!      | HttpTransport |  (reqwest in production)
//!      +---------------+
//! ```
//!
//! # Core Types
//!
//! - [`AddressEngine`] - Entry point for every operation
//! - [`EngineConfig`] - Backend URLs, credentials and limits from `LOCUS_*` variables
//! - [`AddressSuggestion`] - Normalized geocoding candidate
//! - [`ValidationRequest`] / [`ValidationResult`] - Postal validation input and classified outcome
//! - [`LookupOutcome`] - Found, empty or unavailable geocoding result
//! - [`describe_outcome`] - Ordered title/message rules for a validation result

pub mod config;
pub mod engine;
pub mod errors;
pub mod models;
pub mod postal;
pub mod provider;
pub mod registry;
pub mod transport;

pub use config::EngineConfig;
pub use engine::{AddressEngine, DEFAULT_SEARCH_LIMIT};
pub use errors::{AddressError, LookupOutcome, RetryClass};

pub use models::{
    is_valid_coordinate, AddressSuggestion, BoundingBox, CityState, ConfirmationCode,
    ProviderKind, StandardizedAddress, ValidationRequest, ValidationResult, NOT_FOUND_MESSAGE,
};

pub use provider::locationiq::LocationIqProvider;
pub use provider::nominatim::NominatimProvider;
pub use provider::{GeocoderSettings, GeocodingProvider, RateLimit};

pub use registry::{GeocodingGateway, HealthConfig, HealthTracker, ProviderHealthSnapshot};

pub use postal::{
    describe_outcome, Credential, CredentialCache, OutcomeDescription, PostalSettings,
    PostalValidationClient, Severity,
};

pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
