//! Geocoding provider trait definition.

use async_trait::async_trait;

use crate::errors::LookupOutcome;
use crate::models::{AddressSuggestion, ProviderKind};

use super::capabilities::RateLimit;

/// Minimum number of characters before autocomplete calls a backend.
pub const MIN_QUERY_CHARS: usize = 3;

/// Trait for geocoding backends.
///
/// Every operation degrades instead of failing: a short query or a query
/// without matches is [`LookupOutcome::Empty`], and transport errors,
/// non-success statuses and unparseable bodies are
/// [`LookupOutcome::Unavailable`] with the cause logged. The gateway uses
/// the distinction to decide whether to penalize the backend.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use locus_address::provider::{GeocodingProvider, RateLimit};
///
/// struct MyGeocoder;
///
/// #[async_trait]
/// impl GeocodingProvider for MyGeocoder {
///     fn id(&self) -> &'static str {
///         "MY_GEOCODER"
///     }
///
///     fn kind(&self) -> ProviderKind {
///         ProviderKind::Secondary
///     }
///
///     fn rate_limit(&self) -> RateLimit {
///         RateLimit::default()
///     }
///
///     // ... implement lookups
/// }
/// ```
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Constant identifier like "NOMINATIM". Used for logging, error
    /// attribution and rate limiter buckets.
    fn id(&self) -> &'static str;

    /// Which slot of the primary/secondary pair this backend fills.
    fn kind(&self) -> ProviderKind;

    /// Rate limits the gateway applies before calling this backend.
    fn rate_limit(&self) -> RateLimit;

    /// Ranked candidates for a partial free-text query.
    ///
    /// Queries shorter than [`MIN_QUERY_CHARS`] return `Empty` without a
    /// network call.
    async fn autocomplete(&self, query: &str, limit: usize)
        -> LookupOutcome<Vec<AddressSuggestion>>;

    /// Best single match for a full address string.
    async fn forward_geocode(&self, address: &str) -> LookupOutcome<AddressSuggestion>;

    /// Address at the given WGS84 coordinates.
    async fn reverse_geocode(&self, latitude: f64, longitude: f64)
        -> LookupOutcome<AddressSuggestion>;
}

/// True when the trimmed query is long enough to send to a backend.
pub fn query_is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_CHARS
}
