//! Public entry point tying geocoding and postal validation together.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::config::EngineConfig;
use crate::errors::AddressError;
use crate::models::{
    is_valid_coordinate, AddressSuggestion, CityState, ValidationRequest, ValidationResult,
};
use crate::postal::{is_five_digit_zip, CredentialCache, PostalValidationClient};
use crate::provider::{
    locationiq::LocationIqProvider, nominatim::NominatimProvider, query_is_searchable,
    GeocodingProvider,
};
use crate::registry::{GeocodingGateway, HealthTracker, ProviderHealthSnapshot};
use crate::transport::{HttpTransport, ReqwestTransport};

/// Suggestions returned by [`AddressEngine::search_addresses`] when the
/// caller has no preference.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

const DEADLINE_MESSAGE: &str = "Address validation took too long. Please try again.";

/// Address resolution and validation engine.
///
/// Geocoding calls go through the [`GeocodingGateway`] in the order the
/// [`HealthTracker`] picks and collapse "no match" and "backend unavailable"
/// into empty results. Validation goes to USPS and reports business outcomes
/// in [`ValidationResult`]. `Err` is reserved for configuration problems and
/// credential exchange failures.
pub struct AddressEngine {
    gateway: GeocodingGateway,
    health: Arc<HealthTracker>,
    postal: PostalValidationClient,
    deadline: Option<Duration>,
}

impl AddressEngine {
    /// Build an engine that talks to the configured backends over HTTPS.
    pub fn from_config(config: &EngineConfig) -> Result<Self, AddressError> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);
        Ok(Self::with_transport(config, transport))
    }

    /// Build an engine over an arbitrary transport.
    pub fn with_transport(config: &EngineConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let mut providers: Vec<Arc<dyn GeocodingProvider>> = vec![Arc::new(
            NominatimProvider::new(transport.clone(), config.primary_settings()),
        )];

        if let Some(api_key) = &config.locationiq_api_key {
            providers.push(Arc::new(LocationIqProvider::new(
                transport.clone(),
                config.secondary_settings(),
                api_key.clone(),
            )));
        } else {
            debug!("No LocationIQ API key configured, secondary geocoder disabled");
        }

        let health = Arc::new(HealthTracker::with_defaults(config.is_secondary_enabled()));
        let gateway = GeocodingGateway::new(providers, health)
            .with_attempt_timeout(config.request_timeout);
        let postal = PostalValidationClient::new(
            transport,
            config.postal_settings(),
            Arc::new(CredentialCache::new()),
        );

        let mut engine = Self::with_parts(gateway, postal);
        engine.deadline = config.deadline;
        engine
    }

    /// Assemble an engine from prebuilt parts. The health tracker is the one
    /// the gateway records into.
    pub fn with_parts(gateway: GeocodingGateway, postal: PostalValidationClient) -> Self {
        Self {
            health: gateway.health().clone(),
            gateway,
            postal,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Run `future` under the configured deadline. `None` when it elapsed.
    async fn within_deadline<T>(
        &self,
        operation: &str,
        future: impl Future<Output = T>,
    ) -> Option<T> {
        match self.deadline {
            None => Some(future.await),
            Some(deadline) => match tokio::time::timeout(deadline, future).await {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("{} exceeded the {:?} deadline", operation, deadline);
                    None
                }
            },
        }
    }

    /// Autocomplete suggestions for partial input.
    ///
    /// Input shorter than three characters after trimming returns an empty
    /// list without any backend call.
    pub async fn search_addresses(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<AddressSuggestion>, AddressError> {
        let query = text.trim();
        if !query_is_searchable(query) || limit == 0 {
            return Ok(Vec::new());
        }

        let order = self.health.order();
        let outcome = self
            .within_deadline("search", self.gateway.autocomplete(query, limit, &order))
            .await;

        match outcome {
            Some(outcome) => Ok(outcome?.into_vec()),
            None => Ok(Vec::new()),
        }
    }

    /// Best match for a full address string.
    pub async fn geocode_address(
        &self,
        text: &str,
    ) -> Result<Option<AddressSuggestion>, AddressError> {
        let address = text.trim();
        if address.is_empty() {
            return Ok(None);
        }

        let order = self.health.order();
        let outcome = self
            .within_deadline("geocode", self.gateway.forward_geocode(address, &order))
            .await;

        match outcome {
            Some(outcome) => Ok(outcome?.into_option()),
            None => Ok(None),
        }
    }

    /// Address at a coordinate. Out-of-range coordinates return `None`
    /// without any backend call.
    pub async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<AddressSuggestion>, AddressError> {
        if !is_valid_coordinate(latitude, longitude) {
            debug!("Ignoring reverse geocode for invalid coordinate");
            return Ok(None);
        }

        let order = self.health.order();
        let outcome = self
            .within_deadline(
                "reverse geocode",
                self.gateway.reverse_geocode(latitude, longitude, &order),
            )
            .await;

        match outcome {
            Some(outcome) => Ok(outcome?.into_option()),
            None => Ok(None),
        }
    }

    /// Validate a structured address with USPS.
    ///
    /// The deadline covers the credential exchange as well as the validation
    /// request. When it elapses first the caller gets a failed
    /// [`ValidationResult`], even if the exchange was still in flight; only an
    /// exchange that completes with an error is returned as
    /// [`AddressError::CredentialExchange`].
    pub async fn validate_address(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationResult, AddressError> {
        match self
            .within_deadline("validation", self.postal.validate(request))
            .await
        {
            Some(result) => result,
            None => Ok(ValidationResult::failed(DEADLINE_MESSAGE)),
        }
    }

    /// City and state for a ZIP code.
    ///
    /// Anything other than exactly five digits returns `None` without a call.
    pub async fn lookup_zip_code(&self, zip: &str) -> Result<Option<CityState>, AddressError> {
        if !is_five_digit_zip(zip.trim()) {
            return Ok(None);
        }

        match self
            .within_deadline("ZIP lookup", self.postal.lookup_city_state(zip))
            .await
        {
            Some(result) => result,
            None => Ok(None),
        }
    }

    /// Whether postal validation credentials are configured. Callers skip
    /// validation entirely when this is false.
    pub fn is_usps_configured(&self) -> bool {
        self.postal.is_configured()
    }

    pub fn provider_health(&self) -> Vec<ProviderHealthSnapshot> {
        self.health.snapshot()
    }

    pub fn health(&self) -> &Arc<HealthTracker> {
        &self.health
    }

    pub fn gateway(&self) -> &GeocodingGateway {
        &self.gateway
    }
}
