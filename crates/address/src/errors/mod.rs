//! Error types and retry classification for the address engine.
//!
//! This module provides:
//! - [`AddressError`]: The error enum for every engine operation
//! - [`RetryClass`]: How the geocoding gateway reacts to an error
//! - [`LookupOutcome`]: Typed geocoding result that separates "no match" from
//!   "backend unreachable"

mod outcome;
mod retry;

pub use outcome::LookupOutcome;
pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while resolving or validating addresses.
///
/// Each variant is classified into a [`RetryClass`] via
/// [`retry_class`](Self::retry_class), which the gateway uses to decide
/// whether a failed backend is penalized before the next one is tried.
#[derive(Error, Debug)]
pub enum AddressError {
    /// A backend needed for the operation has no credentials configured.
    #[error("{service} is not configured")]
    NotConfigured {
        /// The unconfigured service (e.g., "USPS")
        service: String,
    },

    /// No geocoding backend is registered for the requested order.
    #[error("No geocoding providers available")]
    NoProvidersAvailable,

    /// Caller input or configuration value was rejected before any call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The request never produced an HTTP response.
    #[error("Transport error: {provider} - {message}")]
    Transport {
        /// The backend being called
        provider: String,
        /// Underlying cause
        message: String,
    },

    /// The backend did not answer within the request timeout.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The backend that timed out
        provider: String,
    },

    /// The engine's own rate limiter had no token for the backend within the
    /// attempt timeout. The backend was never contacted.
    #[error("Rate limited: {provider}")]
    Throttled {
        /// The backend that was skipped
        provider: String,
    },

    /// The backend answered with a non-success status.
    #[error("HTTP {status} from {provider}")]
    HttpStatus {
        /// The backend that answered
        provider: String,
        /// Raw HTTP status
        status: u16,
    },

    /// The response body could not be decoded or lacked required content.
    #[error("Parse error: {provider} - {message}")]
    Parse {
        /// The backend whose response failed to parse
        provider: String,
        /// Description of the decoding failure
        message: String,
    },

    /// The OAuth client-credentials exchange failed.
    #[error("Credential exchange failed: {message}")]
    CredentialExchange {
        /// HTTP status of the token endpoint, when one was received
        status: Option<u16>,
        /// Description of the failure
        message: String,
    },

    /// The HTTP client could not be built or used.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl AddressError {
    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::Never`]: configuration and credential problems, the
    ///   other backend will not fare better
    /// - [`RetryClass::FailoverWithPenalty`]: the backend misbehaved, count it
    ///   against its health and move on
    /// - [`RetryClass::NextProvider`]: the backend could not serve this request
    ///   but is not unhealthy
    ///
    /// # Examples
    ///
    /// ```
    /// use locus_address::errors::{AddressError, RetryClass};
    ///
    /// let error = AddressError::Timeout { provider: "NOMINATIM".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::FailoverWithPenalty);
    ///
    /// let error = AddressError::NoProvidersAvailable;
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::NotConfigured { .. }
            | Self::NoProvidersAvailable
            | Self::CredentialExchange { .. } => RetryClass::Never,

            Self::Transport { .. }
            | Self::Timeout { .. }
            | Self::HttpStatus { .. }
            | Self::Parse { .. }
            | Self::Network(_) => RetryClass::FailoverWithPenalty,

            Self::InvalidInput(_) | Self::Throttled { .. } => RetryClass::NextProvider,
        }
    }

    /// True for errors that mean the engine is missing configuration rather
    /// than facing a transient outage.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured { .. } | Self::NoProvidersAvailable
        )
    }

    pub(crate) fn transport(provider: &str, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn parse(provider: &str, message: impl Into<String>) -> Self {
        Self::Parse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}
