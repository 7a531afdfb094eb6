//! Single-slot cache for the postal OAuth access token.

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use log::debug;
use tokio::sync::Mutex;

use crate::errors::AddressError;

/// Tokens this close to expiry are refreshed instead of reused.
pub const REFRESH_MARGIN_SECONDS: i64 = 5 * 60;

/// Access token with its absolute expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Credential that expires `lifetime_seconds` after `issued_at`, as
    /// reported by the token endpoint's `expires_in`.
    pub fn with_lifetime(
        token: impl Into<String>,
        lifetime_seconds: i64,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self::new(token, issued_at + Duration::seconds(lifetime_seconds))
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True when more than `margin` remains before expiry.
    pub fn is_usable_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at - now > margin
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Process-wide credential slot.
///
/// The lock is held across a refresh so concurrent callers that find the slot
/// stale wait for one exchange instead of each starting their own.
pub struct CredentialCache {
    slot: Mutex<Option<Credential>>,
    margin: Duration,
}

impl CredentialCache {
    pub fn new() -> Self {
        Self::with_margin(Duration::seconds(REFRESH_MARGIN_SECONDS))
    }

    pub fn with_margin(margin: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            margin,
        }
    }

    /// Return the cached credential, or run `refresh` and cache its result.
    ///
    /// A failed refresh leaves the slot untouched and propagates the error.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<Credential, AddressError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Credential, AddressError>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(credential) = slot.as_ref() {
            if credential.is_usable_at(Utc::now(), self.margin) {
                return Ok(credential.clone());
            }
            debug!(
                "Cached credential expires at {}, refreshing",
                credential.expires_at
            );
        }

        let fresh = refresh().await?;
        *slot = Some(fresh.clone());
        Ok(fresh)
    }

    pub async fn store(&self, credential: Credential) {
        *self.slot.lock().await = Some(credential);
    }

    pub async fn current(&self) -> Option<Credential> {
        self.slot.lock().await.clone()
    }

    /// Drop the cached credential so the next call exchanges a new one.
    pub async fn invalidate(&self) {
        if self.slot.lock().await.take().is_some() {
            debug!("Credential invalidated");
        }
    }
}

impl Default for CredentialCache {
    fn default() -> Self {
        Self::new()
    }
}
