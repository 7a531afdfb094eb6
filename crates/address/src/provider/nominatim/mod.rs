//! Nominatim (OpenStreetMap) geocoding provider.
//!
//! This is the primary backend:
//! - Autocomplete and forward geocoding via `/search`
//! - Reverse geocoding via `/reverse`
//!
//! The public instance allows at most 1 request per second and requires an
//! identifying User-Agent. No API key is needed.
//! Usage policy: https://operations.osmfoundation.org/policies/nominatim/

mod models;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::{AddressError, LookupOutcome};
use crate::models::{is_valid_coordinate, AddressSuggestion, ProviderKind};
use crate::provider::{
    query_is_searchable, GeocoderSettings, GeocodingProvider, RateLimit, MAX_RESULTS,
};
use crate::transport::{HttpRequest, HttpTransport};

use models::{NominatimError, NominatimPlace};

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const PROVIDER_ID: &str = "NOMINATIM";

/// Nominatim geocoding provider.
pub struct NominatimProvider {
    transport: Arc<dyn HttpTransport>,
    settings: GeocoderSettings,
}

impl NominatimProvider {
    pub fn new(transport: Arc<dyn HttpTransport>, settings: GeocoderSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// GET an endpoint and return the body of a successful response.
    async fn fetch(&self, path: &str, params: &[(&str, String)]) -> Result<String, AddressError> {
        let url = format!("{}{}", self.settings.base_url.trim_end_matches('/'), path);

        let mut request = HttpRequest::get(PROVIDER_ID, url)
            .with_header("user-agent", self.settings.user_agent.as_str())
            .with_header("accept", "application/json")
            .with_timeout(self.settings.timeout);

        for (key, value) in params {
            request = request.with_query(*key, value.as_str());
        }

        debug!("Nominatim request: {} with {} params", path, params.len());

        let response = self.transport.execute(request).await?;

        if !response.is_success() {
            return Err(AddressError::HttpStatus {
                provider: PROVIDER_ID.to_string(),
                status: response.status,
            });
        }

        Ok(response.body)
    }

    /// Run `/search` and decode the place list.
    async fn search_places(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<NominatimPlace>, AddressError> {
        let mut params = vec![
            ("q", query.trim().to_string()),
            ("format", "jsonv2".to_string()),
            ("addressdetails", "1".to_string()),
            ("limit", limit.clamp(1, MAX_RESULTS).to_string()),
            ("countrycodes", self.settings.country_code.clone()),
        ];
        if let Some(viewbox) = &self.settings.viewbox {
            params.push(("viewbox", viewbox.viewbox_param()));
            params.push(("bounded", "0".to_string()));
        }

        let text = self.fetch("/search", &params).await?;

        serde_json::from_str::<Vec<NominatimPlace>>(&text).map_err(|e| {
            AddressError::parse(PROVIDER_ID, format!("Failed to parse search response: {}", e))
        })
    }

    fn normalize(&self, places: Vec<NominatimPlace>, limit: usize) -> Vec<AddressSuggestion> {
        places
            .into_iter()
            .filter(|place| place.in_country(&self.settings.country_code))
            .filter_map(NominatimPlace::into_suggestion)
            .take(limit)
            .collect()
    }
}

#[async_trait]
impl GeocodingProvider for NominatimProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Primary
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 60,
            burst: 1,
        }
    }

    async fn autocomplete(
        &self,
        query: &str,
        limit: usize,
    ) -> LookupOutcome<Vec<AddressSuggestion>> {
        if !query_is_searchable(query) || limit == 0 {
            return LookupOutcome::Empty;
        }

        match self.search_places(query, limit).await {
            Ok(places) => LookupOutcome::from_vec(self.normalize(places, limit)),
            Err(e) => {
                warn!("Nominatim autocomplete failed: {}", e);
                LookupOutcome::Unavailable(e)
            }
        }
    }

    async fn forward_geocode(&self, address: &str) -> LookupOutcome<AddressSuggestion> {
        if address.trim().is_empty() {
            return LookupOutcome::Empty;
        }

        match self.search_places(address, 1).await {
            Ok(places) => self.normalize(places, 1).into_iter().next().into(),
            Err(e) => {
                warn!("Nominatim forward geocode failed: {}", e);
                LookupOutcome::Unavailable(e)
            }
        }
    }

    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> LookupOutcome<AddressSuggestion> {
        if !is_valid_coordinate(latitude, longitude) {
            return LookupOutcome::Empty;
        }

        let params = [
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
            ("format", "jsonv2".to_string()),
            ("addressdetails", "1".to_string()),
            ("zoom", "18".to_string()),
        ];

        let text = match self.fetch("/reverse", &params).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Nominatim reverse geocode failed: {}", e);
                return LookupOutcome::Unavailable(e);
            }
        };

        if let Ok(not_found) = serde_json::from_str::<NominatimError>(&text) {
            debug!(
                "Nominatim found nothing at ({}, {}): {}",
                latitude, longitude, not_found.error
            );
            return LookupOutcome::Empty;
        }

        let place = match serde_json::from_str::<NominatimPlace>(&text) {
            Ok(place) => place,
            Err(e) => {
                let error = AddressError::parse(
                    PROVIDER_ID,
                    format!("Failed to parse reverse response: {}", e),
                );
                warn!("Nominatim reverse geocode failed: {}", error);
                return LookupOutcome::Unavailable(error);
            }
        };

        match place.into_suggestion() {
            Some(suggestion) => LookupOutcome::Found(suggestion),
            None => {
                let error = AddressError::parse(PROVIDER_ID, "Reverse result has no coordinates");
                warn!("Nominatim reverse geocode failed: {}", error);
                LookupOutcome::Unavailable(error)
            }
        }
    }
}
