//! Failover routing across the geocoding backends.
//!
//! The gateway tries backends in the order the caller supplies (normally
//! [`HealthTracker::order`]) and stops at the first one that finds something.
//! Each attempt first takes a token from the backend's bucket. Waiting for the
//! token and the call itself are each bounded by the attempt timeout; only the
//! call counts against the backend's health.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use log::{debug, info, warn};

use super::{HealthTracker, RateLimiter};
use crate::errors::{AddressError, LookupOutcome, RetryClass};
use crate::models::{AddressSuggestion, ProviderKind};
use crate::provider::GeocodingProvider;
use crate::transport::DEFAULT_REQUEST_TIMEOUT;

/// Routes geocoding calls across registered backends.
pub struct GeocodingGateway {
    providers: Vec<Arc<dyn GeocodingProvider>>,
    health: Arc<HealthTracker>,
    rate_limiter: RateLimiter,
    attempt_timeout: Duration,
}

impl GeocodingGateway {
    /// Create a gateway, configuring a rate limit bucket for every backend
    /// from its declared `rate_limit()`.
    pub fn new(providers: Vec<Arc<dyn GeocodingProvider>>, health: Arc<HealthTracker>) -> Self {
        let rate_limiter = RateLimiter::new();
        for provider in &providers {
            rate_limiter.configure(provider.id(), provider.rate_limit());
        }

        Self {
            providers,
            health,
            rate_limiter,
            attempt_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Bound on a single backend attempt, including the rate limiter wait.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn providers(&self) -> &[Arc<dyn GeocodingProvider>] {
        &self.providers
    }

    pub fn health(&self) -> &Arc<HealthTracker> {
        &self.health
    }

    pub async fn autocomplete(
        &self,
        query: &str,
        limit: usize,
        order: &[ProviderKind],
    ) -> Result<LookupOutcome<Vec<AddressSuggestion>>, AddressError> {
        let query = query.to_string();
        self.route("autocomplete", order, move |provider| {
            let query = query.clone();
            Box::pin(async move { provider.autocomplete(&query, limit).await })
        })
        .await
    }

    pub async fn forward_geocode(
        &self,
        address: &str,
        order: &[ProviderKind],
    ) -> Result<LookupOutcome<AddressSuggestion>, AddressError> {
        let address = address.to_string();
        self.route("forward_geocode", order, move |provider| {
            let address = address.clone();
            Box::pin(async move { provider.forward_geocode(&address).await })
        })
        .await
    }

    pub async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
        order: &[ProviderKind],
    ) -> Result<LookupOutcome<AddressSuggestion>, AddressError> {
        self.route("reverse_geocode", order, move |provider| {
            Box::pin(async move { provider.reverse_geocode(latitude, longitude).await })
        })
        .await
    }

    /// Registered backends in `order`. Kinds without a backend are skipped.
    fn ordered_providers(&self, order: &[ProviderKind]) -> Vec<Arc<dyn GeocodingProvider>> {
        order
            .iter()
            .filter_map(|kind| {
                let found = self.providers.iter().find(|p| p.kind() == *kind).cloned();
                if found.is_none() {
                    debug!("No {} geocoding backend registered, skipping", kind);
                }
                found
            })
            .collect()
    }

    /// Run `call` against each backend in order until one finds a result.
    ///
    /// Exhaustion is not an error: the result is `Empty` when some backend
    /// answered with no match, otherwise `Unavailable` with the last failure.
    /// Only `Err` for configuration problems.
    async fn route<T, F>(
        &self,
        operation: &'static str,
        order: &[ProviderKind],
        call: F,
    ) -> Result<LookupOutcome<T>, AddressError>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn GeocodingProvider>) -> BoxFuture<'static, LookupOutcome<T>> + Send + Sync,
    {
        let providers = self.ordered_providers(order);
        if providers.is_empty() {
            warn!("No geocoding backends available for {}", operation);
            return Err(AddressError::NoProvidersAvailable);
        }

        let mut saw_empty = false;
        let mut last_error: Option<AddressError> = None;

        for provider in providers {
            let provider_id = provider.id();
            let kind = provider.kind();

            if !self.rate_limiter.try_acquire(provider_id) {
                let wait = self.rate_limiter.acquire(provider_id);
                if tokio::time::timeout(self.attempt_timeout, wait).await.is_err() {
                    debug!(
                        "'{}' still throttled after {:?}, skipping for {}",
                        provider_id, self.attempt_timeout, operation
                    );
                    last_error = Some(AddressError::Throttled {
                        provider: provider_id.to_string(),
                    });
                    continue;
                }
            }

            let attempt = call(provider.clone());
            let outcome = match tokio::time::timeout(self.attempt_timeout, attempt).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(
                        "{} on '{}' timed out after {:?}",
                        operation, provider_id, self.attempt_timeout
                    );
                    LookupOutcome::Unavailable(AddressError::Timeout {
                        provider: provider_id.to_string(),
                    })
                }
            };

            match outcome {
                LookupOutcome::Found(value) => {
                    self.health.record_success(kind);
                    debug!("{} served by '{}'", operation, provider_id);
                    return Ok(LookupOutcome::Found(value));
                }
                LookupOutcome::Empty => {
                    self.health.record_success(kind);
                    debug!("{} on '{}' found nothing, trying next", operation, provider_id);
                    saw_empty = true;
                }
                LookupOutcome::Unavailable(e) => {
                    match e.retry_class() {
                        RetryClass::Never => {
                            debug!(
                                "Terminal error from '{}': {}, not retrying",
                                provider_id, e
                            );
                            return Err(e);
                        }
                        RetryClass::FailoverWithPenalty => {
                            self.health.record_failure(kind);
                            info!(
                                "{} on '{}' failed: {}, recorded failure and failing over",
                                operation, provider_id, e
                            );
                        }
                        RetryClass::NextProvider => {
                            debug!("'{}' could not serve {}: {}", provider_id, operation, e);
                        }
                    }
                    last_error = Some(e);
                }
            }
        }

        if saw_empty {
            return Ok(LookupOutcome::Empty);
        }

        Ok(last_error
            .map(LookupOutcome::Unavailable)
            .unwrap_or(LookupOutcome::Empty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::RateLimit;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy)]
    enum Behavior {
        Finds,
        FindsNothing,
        Fails,
        Hangs,
        Misconfigured,
    }

    struct MockProvider {
        id: &'static str,
        kind: ProviderKind,
        behavior: Behavior,
        rate_limit: RateLimit,
        call_count: AtomicUsize,
    }

    impl MockProvider {
        fn new(id: &'static str, kind: ProviderKind, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                id,
                kind,
                behavior,
                rate_limit: RateLimit {
                    requests_per_minute: 60_000,
                    burst: 1_000,
                },
                call_count: AtomicUsize::new(0),
            })
        }

        fn one_per_second(id: &'static str, kind: ProviderKind, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                id,
                kind,
                behavior,
                rate_limit: RateLimit::default(),
                call_count: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        fn suggestion(&self) -> AddressSuggestion {
            AddressSuggestion {
                id: format!("{}-1", self.id),
                display_name: "1200 Main St, Kansas City, MO 64105".to_string(),
                street_address: "1200 Main St".to_string(),
                city: "Kansas City".to_string(),
                state: "MO".to_string(),
                zip: "64105".to_string(),
                latitude: 39.0997,
                longitude: -94.5786,
                place_type: "house".to_string(),
                provider: self.kind,
            }
        }

        async fn respond(&self) -> LookupOutcome<AddressSuggestion> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Finds => LookupOutcome::Found(self.suggestion()),
                Behavior::FindsNothing => LookupOutcome::Empty,
                Behavior::Fails => LookupOutcome::Unavailable(AddressError::transport(
                    self.id,
                    "connection refused",
                )),
                Behavior::Hangs => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    LookupOutcome::Found(self.suggestion())
                }
                Behavior::Misconfigured => LookupOutcome::Unavailable(AddressError::NotConfigured {
                    service: self.id.to_string(),
                }),
            }
        }
    }

    #[async_trait]
    impl GeocodingProvider for MockProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn rate_limit(&self) -> RateLimit {
            self.rate_limit.clone()
        }

        async fn autocomplete(
            &self,
            _query: &str,
            _limit: usize,
        ) -> LookupOutcome<Vec<AddressSuggestion>> {
            self.respond().await.map(|s| vec![s])
        }

        async fn forward_geocode(&self, _address: &str) -> LookupOutcome<AddressSuggestion> {
            self.respond().await
        }

        async fn reverse_geocode(
            &self,
            _latitude: f64,
            _longitude: f64,
        ) -> LookupOutcome<AddressSuggestion> {
            self.respond().await
        }
    }

    fn gateway(
        primary: &Arc<MockProvider>,
        secondary: &Arc<MockProvider>,
    ) -> (GeocodingGateway, Arc<HealthTracker>) {
        let health = Arc::new(HealthTracker::with_defaults(true));
        let providers: Vec<Arc<dyn GeocodingProvider>> = vec![primary.clone(), secondary.clone()];
        (GeocodingGateway::new(providers, health.clone()), health)
    }

    const BOTH: [ProviderKind; 2] = [ProviderKind::Primary, ProviderKind::Secondary];

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let primary = MockProvider::new("P", ProviderKind::Primary, Behavior::Finds);
        let secondary = MockProvider::new("S", ProviderKind::Secondary, Behavior::Finds);
        let (gateway, _) = gateway(&primary, &secondary);

        let result = gateway.forward_geocode("1200 Main", &BOTH).await.unwrap();

        assert_eq!(result.into_option().unwrap().provider, ProviderKind::Primary);
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_falls_over_and_penalizes_once() {
        let primary = MockProvider::new("P", ProviderKind::Primary, Behavior::Fails);
        let secondary = MockProvider::new("S", ProviderKind::Secondary, Behavior::Finds);
        let (gateway, health) = gateway(&primary, &secondary);

        let result = gateway.autocomplete("1200 Main", 5, &BOTH).await.unwrap();

        let suggestions = result.into_vec();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].provider, ProviderKind::Secondary);
        assert_eq!(health.failure_count(ProviderKind::Primary), 1);
        assert_eq!(health.failure_count(ProviderKind::Secondary), 0);
    }

    #[tokio::test]
    async fn test_empty_falls_over_without_penalty() {
        let primary = MockProvider::new("P", ProviderKind::Primary, Behavior::FindsNothing);
        let secondary = MockProvider::new("S", ProviderKind::Secondary, Behavior::Finds);
        let (gateway, health) = gateway(&primary, &secondary);

        let result = gateway.reverse_geocode(39.0, -94.5, &BOTH).await.unwrap();

        assert!(result.is_found());
        assert_eq!(secondary.calls(), 1);
        assert_eq!(health.failure_count(ProviderKind::Primary), 0);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_outcome_not_error() {
        let primary = MockProvider::new("P", ProviderKind::Primary, Behavior::Fails);
        let secondary = MockProvider::new("S", ProviderKind::Secondary, Behavior::FindsNothing);
        let (gateway, health) = gateway(&primary, &secondary);

        let result = gateway.forward_geocode("nowhere", &BOTH).await.unwrap();
        assert!(result.is_empty());

        let primary_only = [ProviderKind::Primary];
        let result = gateway.forward_geocode("nowhere", &primary_only).await.unwrap();
        assert!(result.is_unavailable());
        assert_eq!(health.failure_count(ProviderKind::Primary), 2);
    }

    #[tokio::test]
    async fn test_follows_supplied_order() {
        let primary = MockProvider::new("P", ProviderKind::Primary, Behavior::Finds);
        let secondary = MockProvider::new("S", ProviderKind::Secondary, Behavior::Finds);
        let (gateway, _) = gateway(&primary, &secondary);

        let order = [ProviderKind::Secondary, ProviderKind::Primary];
        let result = gateway.forward_geocode("1200 Main", &order).await.unwrap();

        assert_eq!(result.into_option().unwrap().provider, ProviderKind::Secondary);
        assert_eq!(primary.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_registered_backend_is_error() {
        let primary = MockProvider::new("P", ProviderKind::Primary, Behavior::Finds);
        let health = Arc::new(HealthTracker::with_defaults(false));
        let providers: Vec<Arc<dyn GeocodingProvider>> = vec![primary.clone()];
        let gateway = GeocodingGateway::new(providers, health);

        let result = gateway
            .forward_geocode("1200 Main", &[ProviderKind::Secondary])
            .await;
        assert!(matches!(result, Err(AddressError::NoProvidersAvailable)));
    }

    #[tokio::test]
    async fn test_terminal_error_stops_failover() {
        let primary = MockProvider::new("P", ProviderKind::Primary, Behavior::Misconfigured);
        let secondary = MockProvider::new("S", ProviderKind::Secondary, Behavior::Finds);
        let (gateway, _) = gateway(&primary, &secondary);

        let result = gateway.forward_geocode("1200 Main", &BOTH).await;

        assert!(matches!(result, Err(AddressError::NotConfigured { .. })));
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let primary = MockProvider::new("P", ProviderKind::Primary, Behavior::Hangs);
        let secondary = MockProvider::new("S", ProviderKind::Secondary, Behavior::Finds);
        let health = Arc::new(HealthTracker::with_defaults(true));
        let providers: Vec<Arc<dyn GeocodingProvider>> = vec![primary.clone(), secondary.clone()];
        let gateway = GeocodingGateway::new(providers, health.clone())
            .with_attempt_timeout(Duration::from_millis(50));

        let result = gateway.forward_geocode("1200 Main", &BOTH).await.unwrap();

        assert_eq!(result.into_option().unwrap().provider, ProviderKind::Secondary);
        assert_eq!(health.failure_count(ProviderKind::Primary), 1);
    }

    #[tokio::test]
    async fn test_throttled_backend_is_skipped_without_penalty() {
        let primary =
            MockProvider::one_per_second("P", ProviderKind::Primary, Behavior::FindsNothing);
        let health = Arc::new(HealthTracker::with_defaults(true));
        let providers: Vec<Arc<dyn GeocodingProvider>> = vec![primary.clone()];
        let gateway = GeocodingGateway::new(providers, health.clone())
            .with_attempt_timeout(Duration::from_millis(200));
        let primary_only = [ProviderKind::Primary];

        let first = gateway.forward_geocode("1200 Main", &primary_only).await.unwrap();
        assert!(first.is_empty());

        for _ in 0..3 {
            let result = gateway.forward_geocode("1200 Main", &primary_only).await.unwrap();
            assert!(matches!(
                result,
                LookupOutcome::Unavailable(AddressError::Throttled { .. })
            ));
        }

        assert_eq!(primary.calls(), 1);
        assert_eq!(health.failure_count(ProviderKind::Primary), 0);
        assert_eq!(health.order(), vec![ProviderKind::Primary, ProviderKind::Secondary]);
    }

    #[tokio::test]
    async fn test_throttled_backend_fails_over_to_next() {
        let primary = MockProvider::one_per_second("P", ProviderKind::Primary, Behavior::Finds);
        let secondary = MockProvider::new("S", ProviderKind::Secondary, Behavior::Finds);
        let health = Arc::new(HealthTracker::with_defaults(true));
        let providers: Vec<Arc<dyn GeocodingProvider>> = vec![primary.clone(), secondary.clone()];
        let gateway = GeocodingGateway::new(providers, health.clone())
            .with_attempt_timeout(Duration::from_millis(100));

        let first = gateway.forward_geocode("1200 Main", &BOTH).await.unwrap();
        assert_eq!(first.into_option().unwrap().provider, ProviderKind::Primary);

        let second = gateway.forward_geocode("1200 Main", &BOTH).await.unwrap();
        assert_eq!(second.into_option().unwrap().provider, ProviderKind::Secondary);
        assert_eq!(primary.calls(), 1);
        assert_eq!(health.failure_count(ProviderKind::Primary), 0);
    }
}
