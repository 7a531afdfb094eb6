//! Geocoding backends.
//!
//! Each backend implements [`GeocodingProvider`] and normalizes its responses
//! into [`AddressSuggestion`](crate::models::AddressSuggestion).

mod capabilities;
mod traits;

pub mod locationiq;
pub mod nominatim;

pub use capabilities::RateLimit;
pub use traits::{query_is_searchable, GeocodingProvider, MIN_QUERY_CHARS};

use std::time::Duration;

use crate::models::BoundingBox;
use crate::transport::DEFAULT_REQUEST_TIMEOUT;

/// Upper bound on suggestions requested from any backend.
pub const MAX_RESULTS: usize = 20;

/// Country filter applied when none is configured.
pub const DEFAULT_COUNTRY_CODE: &str = "us";

/// Connection settings shared by the geocoding adapters.
#[derive(Clone, Debug)]
pub struct GeocoderSettings {
    pub base_url: String,
    /// Identifying User-Agent sent with every request.
    pub user_agent: String,
    /// ISO 3166-1 alpha-2 country filter, lowercase.
    pub country_code: String,
    /// Optional metro bias. Results outside are still returned.
    pub viewbox: Option<BoundingBox>,
    pub timeout: Duration,
}

impl GeocoderSettings {
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_agent: user_agent.into(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            viewbox: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
