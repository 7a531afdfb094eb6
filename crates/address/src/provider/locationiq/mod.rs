//! LocationIQ geocoding provider.
//!
//! Secondary backend, only registered when an API key is configured.
//! Free tier: 2 requests/second, 5000/day.
//! API docs: https://docs.locationiq.com/reference

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

use models::LocationIqPlace;

pub const DEFAULT_BASE_URL: &str = "https://us1.locationiq.com/v1";
const PROVIDER_ID: &str = "LOCATIONIQ";

/// LocationIQ geocoding provider.
pub struct LocationIqProvider {
    transport: Arc<dyn HttpTransport>,
    settings: GeocoderSettings,
    api_key: String,
}

impl LocationIqProvider {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        settings: GeocoderSettings,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            settings,
            api_key: api_key.into(),
        }
    }

    /// GET an endpoint. `Ok(None)` means LocationIQ reported no match, which it
    /// does with a 404.
    async fn fetch(
        &self,
        path: &str,
        params: Vec<(&str, String)>,
    ) -> Result<Option<String>, AddressError> {
        let url = format!("{}{}", self.settings.base_url.trim_end_matches('/'), path);

        let mut request = HttpRequest::get(PROVIDER_ID, url)
            .with_header("user-agent", self.settings.user_agent.as_str())
            .with_header("accept", "application/json")
            .with_timeout(self.settings.timeout)
            .with_query("key", self.api_key.as_str());

        for (key, value) in params {
            request = request.with_query(key, value);
        }

        // Never log the request itself, the query carries the API key.
        debug!("LocationIQ request: {}", path);

        let response = self.transport.execute(request).await?;

        match response.status {
            404 => Ok(None),
            _ if response.is_success() => Ok(Some(response.body)),
            status => Err(AddressError::HttpStatus {
                provider: PROVIDER_ID.to_string(),
                status,
            }),
        }
    }

    fn bias_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("countrycodes", self.settings.country_code.clone())];
        if let Some(viewbox) = &self.settings.viewbox {
            params.push(("viewbox", viewbox.viewbox_param()));
            params.push(("bounded", "0".to_string()));
        }
        params
    }

    async fn fetch_places(
        &self,
        path: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<LocationIqPlace>, AddressError> {
        let mut params = vec![
            ("q", query.trim().to_string()),
            ("limit", limit.clamp(1, MAX_RESULTS).to_string()),
            ("format", "json".to_string()),
            ("addressdetails", "1".to_string()),
        ];
        params.extend(self.bias_params());

        match self.fetch(path, params).await? {
            Some(text) => serde_json::from_str::<Vec<LocationIqPlace>>(&text).map_err(|e| {
                AddressError::parse(PROVIDER_ID, format!("Failed to parse {}: {}", path, e))
            }),
            None => Ok(Vec::new()),
        }
    }

    fn normalize(&self, places: Vec<LocationIqPlace>, limit: usize) -> Vec<AddressSuggestion> {
        places
            .into_iter()
            .filter(|place| place.in_country(&self.settings.country_code))
            .filter_map(LocationIqPlace::into_suggestion)
            .take(limit)
            .collect()
    }
}

#[async_trait]
impl GeocodingProvider for LocationIqProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Secondary
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 120,
            burst: 2,
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

        match self.fetch_places("/autocomplete", query, limit).await {
            Ok(places) => LookupOutcome::from_vec(self.normalize(places, limit)),
            Err(e) => {
                warn!("LocationIQ autocomplete failed: {}", e);
                LookupOutcome::Unavailable(e)
            }
        }
    }

    async fn forward_geocode(&self, address: &str) -> LookupOutcome<AddressSuggestion> {
        if address.trim().is_empty() {
            return LookupOutcome::Empty;
        }

        match self.fetch_places("/search", address, 1).await {
            Ok(places) => self.normalize(places, 1).into_iter().next().into(),
            Err(e) => {
                warn!("LocationIQ forward geocode failed: {}", e);
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

        let params = vec![
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
            ("format", "json".to_string()),
            ("addressdetails", "1".to_string()),
        ];

        let text = match self.fetch("/reverse", params).await {
            Ok(Some(text)) => text,
            Ok(None) => return LookupOutcome::Empty,
            Err(e) => {
                warn!("LocationIQ reverse geocode failed: {}", e);
                return LookupOutcome::Unavailable(e);
            }
        };

        let parsed = serde_json::from_str::<LocationIqPlace>(&text)
            .map_err(|e| AddressError::parse(PROVIDER_ID, format!("Failed to parse /reverse: {}", e)))
            .and_then(|place| {
                place.into_suggestion().ok_or_else(|| {
                    AddressError::parse(PROVIDER_ID, "Reverse result has no coordinates")
                })
            });

        match parsed {
            Ok(suggestion) => LookupOutcome::Found(suggestion),
            Err(e) => {
                warn!("LocationIQ reverse geocode failed: {}", e);
                LookupOutcome::Unavailable(e)
            }
        }
    }
}
