//! USPS Addresses 3.0 client.
//!
//! Every call first obtains an OAuth access token from the shared
//! [`CredentialCache`], exchanging client credentials when the cached token
//! is missing or about to expire.
//! API docs: https://developer.usps.com/addressesv3

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};

use super::classify::classify;
use super::credential_cache::{Credential, CredentialCache};
use super::models::{AddressResponse, CityStateResponse, ErrorResponse, TokenResponse};
use crate::errors::AddressError;
use crate::models::{CityState, ValidationRequest, ValidationResult};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, DEFAULT_REQUEST_TIMEOUT};

pub const DEFAULT_BASE_URL: &str = "https://apis.usps.com";
pub(crate) const SERVICE_ID: &str = "USPS";

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 3600;

const UNREACHABLE_MESSAGE: &str =
    "Unable to reach the address validation service. Please try again later.";
const MISSING_STREET_MESSAGE: &str = "A street address is required for validation.";

/// OAuth client credentials.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct PostalSettings {
    pub base_url: String,
    /// `None` disables validation.
    pub credentials: Option<ClientCredentials>,
    pub user_agent: String,
    pub timeout: Duration,
}

impl PostalSettings {
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credentials: None,
            user_agent: user_agent.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.credentials = Some(ClientCredentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        });
        self
    }
}

/// Postal validation client.
pub struct PostalValidationClient {
    transport: Arc<dyn HttpTransport>,
    settings: PostalSettings,
    credentials: Arc<CredentialCache>,
}

impl PostalValidationClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        settings: PostalSettings,
        credentials: Arc<CredentialCache>,
    ) -> Self {
        Self {
            transport,
            settings,
            credentials,
        }
    }

    /// True when client credentials are configured.
    pub fn is_configured(&self) -> bool {
        self.settings.credentials.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    /// Cached access token, exchanging credentials when needed.
    async fn access_token(&self) -> Result<Credential, AddressError> {
        let credentials = self
            .settings
            .credentials
            .as_ref()
            .ok_or_else(|| AddressError::NotConfigured {
                service: SERVICE_ID.to_string(),
            })?;

        self.credentials
            .get_or_refresh(|| self.exchange_credentials(credentials))
            .await
    }

    /// Client-credentials grant against `/oauth2/v3/token`.
    async fn exchange_credentials(
        &self,
        credentials: &ClientCredentials,
    ) -> Result<Credential, AddressError> {
        debug!("Exchanging USPS client credentials for an access token");

        let request = HttpRequest::post(SERVICE_ID, self.url("/oauth2/v3/token"))
            .with_header("user-agent", self.settings.user_agent.as_str())
            .with_header("accept", "application/json")
            .with_timeout(self.settings.timeout)
            .with_form(vec![
                ("grant_type".to_string(), "client_credentials".to_string()),
                ("client_id".to_string(), credentials.client_id.clone()),
                ("client_secret".to_string(), credentials.client_secret.clone()),
            ]);

        let response = self.transport.execute(request).await.map_err(|e| {
            AddressError::CredentialExchange {
                status: None,
                message: e.to_string(),
            }
        })?;

        if !response.is_success() {
            return Err(AddressError::CredentialExchange {
                status: Some(response.status),
                message: error_message(&response),
            });
        }

        let token: TokenResponse =
            serde_json::from_str(&response.body).map_err(|e| AddressError::CredentialExchange {
                status: Some(response.status),
                message: format!("Failed to parse token response: {}", e),
            })?;

        let lifetime = token
            .expires_in
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECONDS);
        info!("Obtained USPS access token valid for {}s", lifetime);

        Ok(Credential::with_lifetime(
            token.access_token,
            lifetime,
            Utc::now(),
        ))
    }

    async fn authorized_get(
        &self,
        path: &str,
        params: Vec<(&str, String)>,
    ) -> Result<Result<HttpResponse, AddressError>, AddressError> {
        let credential = self.access_token().await?;

        let mut request = HttpRequest::get(SERVICE_ID, self.url(path))
            .with_header("user-agent", self.settings.user_agent.as_str())
            .with_header("accept", "application/json")
            .with_bearer(credential.token())
            .with_timeout(self.settings.timeout);
        for (key, value) in params {
            request = request.with_query(key, value);
        }

        let response = self.transport.execute(request).await;
        if let Ok(response) = &response {
            if response.status == 401 {
                warn!("USPS rejected the access token, invalidating cached credential");
                self.credentials.invalidate().await;
            }
        }
        Ok(response)
    }

    /// Validate and standardize a structured address.
    ///
    /// Returns `Err` only when validation is not configured or the credential
    /// exchange fails. Every other failure, including transport errors, is a
    /// `ValidationResult` with `error` set.
    pub async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationResult, AddressError> {
        if !self.is_configured() {
            return Err(AddressError::NotConfigured {
                service: SERVICE_ID.to_string(),
            });
        }
        if request.street_address.trim().is_empty() {
            return Ok(ValidationResult::failed(MISSING_STREET_MESSAGE));
        }

        let mut params = vec![("streetAddress", request.street_address.trim().to_string())];
        if let Some(secondary) = &request.secondary_address {
            params.push(("secondaryAddress", secondary.trim().to_string()));
        }
        params.push(("city", request.city.trim().to_string()));
        params.push(("state", request.state.trim().to_string()));
        params.push(("ZIPCode", request.zip_code.trim().to_string()));

        let response = match self.authorized_get("/addresses/v3/address", params).await? {
            Ok(response) => response,
            Err(e) => {
                warn!("USPS validation request failed: {}", e);
                return Ok(ValidationResult::failed(UNREACHABLE_MESSAGE));
            }
        };

        match response.status {
            404 => {
                debug!("USPS reported address not found");
                Ok(ValidationResult::not_found())
            }
            _ if response.is_success() => {
                match serde_json::from_str::<AddressResponse>(&response.body) {
                    Ok(parsed) => Ok(classify(parsed, request)),
                    Err(e) => {
                        warn!("Failed to parse USPS validation response: {}", e);
                        Ok(ValidationResult::failed(
                            "The address validation service returned an unreadable response.",
                        ))
                    }
                }
            }
            status => {
                warn!(
                    "USPS validation returned HTTP {}: {}",
                    status,
                    error_message(&response)
                );
                Ok(ValidationResult::failed(format!(
                    "Address validation failed (HTTP {}).",
                    status
                )))
            }
        }
    }

    /// City and state for a five-digit ZIP code.
    ///
    /// `Ok(None)` for malformed ZIPs (no call is made), unknown ZIPs and
    /// backend failures.
    pub async fn lookup_city_state(&self, zip: &str) -> Result<Option<CityState>, AddressError> {
        let zip = zip.trim();
        if !is_five_digit_zip(zip) {
            debug!("Skipping city/state lookup for malformed ZIP");
            return Ok(None);
        }
        if !self.is_configured() {
            return Err(AddressError::NotConfigured {
                service: SERVICE_ID.to_string(),
            });
        }

        let params = vec![("ZIPCode", zip.to_string())];
        let response = match self.authorized_get("/addresses/v3/city-state", params).await? {
            Ok(response) => response,
            Err(e) => {
                warn!("USPS city/state request failed: {}", e);
                return Ok(None);
            }
        };

        if !response.is_success() {
            if response.status != 404 {
                warn!("USPS city/state lookup returned HTTP {}", response.status);
            }
            return Ok(None);
        }

        match serde_json::from_str::<CityStateResponse>(&response.body) {
            Ok(parsed) => Ok(Some(CityState {
                city: parsed.city,
                state: parsed.state,
            })),
            Err(e) => {
                warn!("Failed to parse USPS city/state response: {}", e);
                Ok(None)
            }
        }
    }
}

pub(crate) fn is_five_digit_zip(zip: &str) -> bool {
    zip.len() == 5 && zip.bytes().all(|b| b.is_ascii_digit())
}

/// Best-effort message from a USPS error body.
fn error_message(response: &HttpResponse) -> String {
    serde_json::from_str::<ErrorResponse>(&response.body)
        .map(|parsed| parsed.error.message)
        .ok()
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", response.status))
}
