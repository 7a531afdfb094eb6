//! Engine configuration, read from `LOCUS_*` environment variables.

use std::fmt;
use std::time::Duration;

use log::warn;

use crate::errors::AddressError;
use crate::models::BoundingBox;
use crate::postal::{self, ClientCredentials, PostalSettings};
use crate::provider::{locationiq, nominatim, GeocoderSettings, DEFAULT_COUNTRY_CODE};
use crate::transport::DEFAULT_REQUEST_TIMEOUT;

pub const DEFAULT_USER_AGENT: &str = concat!("locus-address/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct EngineConfig {
    pub nominatim_url: String,
    pub locationiq_url: String,
    /// `None` disables the secondary geocoder.
    pub locationiq_api_key: Option<String>,
    pub usps_url: String,
    /// `None` disables postal validation.
    pub usps_credentials: Option<ClientCredentials>,
    pub user_agent: String,
    pub country_code: String,
    pub viewbox: Option<BoundingBox>,
    pub request_timeout: Duration,
    /// Bound on each whole engine operation.
    pub deadline: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            nominatim_url: nominatim::DEFAULT_BASE_URL.to_string(),
            locationiq_url: locationiq::DEFAULT_BASE_URL.to_string(),
            locationiq_api_key: None,
            usps_url: postal::DEFAULT_BASE_URL.to_string(),
            usps_credentials: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            viewbox: Some(BoundingBox::kansas_city()),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            deadline: None,
        }
    }
}

impl EngineConfig {
    /// Read configuration from the process environment.
    ///
    /// Unset and empty variables take their defaults. Malformed numbers or
    /// viewboxes are an `InvalidInput` error.
    pub fn from_env() -> Result<Self, AddressError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AddressError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let usps_credentials = match (var("LOCUS_USPS_CLIENT_ID"), var("LOCUS_USPS_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(ClientCredentials {
                client_id,
                client_secret,
            }),
            (None, None) => None,
            _ => {
                warn!("Only one of LOCUS_USPS_CLIENT_ID and LOCUS_USPS_CLIENT_SECRET is set, postal validation disabled");
                None
            }
        };

        let viewbox = match var("LOCUS_METRO_VIEWBOX") {
            Some(raw) if raw.eq_ignore_ascii_case("none") => None,
            Some(raw) => Some(raw.parse::<BoundingBox>()?),
            None => defaults.viewbox,
        };

        let request_timeout = match var("LOCUS_REQUEST_TIMEOUT_MS") {
            Some(raw) => parse_millis("LOCUS_REQUEST_TIMEOUT_MS", &raw)?,
            None => defaults.request_timeout,
        };

        let deadline = var("LOCUS_DEADLINE_MS")
            .map(|raw| parse_millis("LOCUS_DEADLINE_MS", &raw))
            .transpose()?;

        let country_code = match var("LOCUS_COUNTRY_CODE") {
            Some(raw) => parse_country_code(&raw)?,
            None => defaults.country_code,
        };

        Ok(Self {
            nominatim_url: var("LOCUS_NOMINATIM_URL").unwrap_or(defaults.nominatim_url),
            locationiq_url: var("LOCUS_LOCATIONIQ_URL").unwrap_or(defaults.locationiq_url),
            locationiq_api_key: var("LOCUS_LOCATIONIQ_API_KEY"),
            usps_url: var("LOCUS_USPS_URL").unwrap_or(defaults.usps_url),
            usps_credentials,
            user_agent: var("LOCUS_USER_AGENT").unwrap_or(defaults.user_agent),
            country_code,
            viewbox,
            request_timeout,
            deadline,
        })
    }

    pub fn with_nominatim_url(mut self, url: impl Into<String>) -> Self {
        self.nominatim_url = url.into();
        self
    }

    pub fn with_locationiq(mut self, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.locationiq_url = url.into();
        self.locationiq_api_key = Some(api_key.into());
        self
    }

    pub fn with_usps(
        mut self,
        url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.usps_url = url.into();
        self.usps_credentials = Some(ClientCredentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        });
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_country_code(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = country_code.into().to_ascii_lowercase();
        self
    }

    pub fn with_viewbox(mut self, viewbox: Option<BoundingBox>) -> Self {
        self.viewbox = viewbox;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn is_secondary_enabled(&self) -> bool {
        self.locationiq_api_key.is_some()
    }

    pub(crate) fn primary_settings(&self) -> GeocoderSettings {
        self.geocoder_settings(&self.nominatim_url)
    }

    pub(crate) fn secondary_settings(&self) -> GeocoderSettings {
        self.geocoder_settings(&self.locationiq_url)
    }

    fn geocoder_settings(&self, base_url: &str) -> GeocoderSettings {
        GeocoderSettings {
            base_url: base_url.to_string(),
            user_agent: self.user_agent.clone(),
            country_code: self.country_code.clone(),
            viewbox: self.viewbox,
            timeout: self.request_timeout,
        }
    }

    pub(crate) fn postal_settings(&self) -> PostalSettings {
        PostalSettings {
            base_url: self.usps_url.clone(),
            credentials: self.usps_credentials.clone(),
            user_agent: self.user_agent.clone(),
            timeout: self.request_timeout,
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("nominatim_url", &self.nominatim_url)
            .field("locationiq_url", &self.locationiq_url)
            .field(
                "locationiq_api_key",
                &self.locationiq_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("usps_url", &self.usps_url)
            .field("usps_credentials", &self.usps_credentials)
            .field("user_agent", &self.user_agent)
            .field("country_code", &self.country_code)
            .field("viewbox", &self.viewbox)
            .field("request_timeout", &self.request_timeout)
            .field("deadline", &self.deadline)
            .finish()
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<Duration, AddressError> {
    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(AddressError::InvalidInput(format!(
            "{} must be a positive number of milliseconds, got '{}'",
            key, raw
        ))),
        Ok(millis) => Ok(Duration::from_millis(millis)),
    }
}

fn parse_country_code(raw: &str) -> Result<String, AddressError> {
    if raw.len() == 2 && raw.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(raw.to_ascii_lowercase())
    } else {
        Err(AddressError::InvalidInput(format!(
            "LOCUS_COUNTRY_CODE must be a two-letter code, got '{}'",
            raw
        )))
    }
}
