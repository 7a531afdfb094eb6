//! Token bucket rate limiter for geocoding backends.
//!
//! Each backend gets its own bucket sized from the [`RateLimit`] it declares.
//! Buckets for unknown backends fall back to [`RateLimit::default`], which is
//! the public Nominatim policy of one request per second.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::provider::RateLimit;

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
    /// Tokens per second.
    rate: f64,
    capacity: f64,
}

impl TokenBucket {
    fn from_limit(limit: &RateLimit) -> Self {
        let capacity = f64::from(limit.burst.max(1));
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate: f64::from(limit.requests_per_minute.max(1)) / 60.0,
            capacity,
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_available(&mut self) -> Duration {
        self.refill();
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.rate)
        }
    }
}

/// Per-backend token bucket limiter.
pub struct RateLimiter {
    buckets: Mutex<HashMap<&'static str, TokenBucket>>,
    limits: Mutex<HashMap<&'static str, RateLimit>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            limits: Mutex::new(HashMap::new()),
        }
    }

    /// Worst case after poisoning is slightly off throttling, so recover.
    fn lock_buckets(&self) -> MutexGuard<'_, HashMap<&'static str, TokenBucket>> {
        self.buckets.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter buckets mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_limits(&self) -> MutexGuard<'_, HashMap<&'static str, RateLimit>> {
        self.limits.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter limits mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Set the limit for a backend, discarding any existing bucket.
    pub fn configure(&self, provider: &'static str, limit: RateLimit) {
        self.lock_limits().insert(provider, limit);
        self.lock_buckets().remove(provider);
    }

    /// Wait until a token is available for the backend.
    pub async fn acquire(&self, provider: &'static str) {
        loop {
            let wait_time = {
                let mut buckets = self.lock_buckets();
                let bucket = buckets
                    .entry(provider)
                    .or_insert_with(|| self.create_bucket(provider));

                if bucket.try_acquire() {
                    return;
                }
                bucket.time_until_available()
            };

            if wait_time > Duration::ZERO {
                debug!("Rate limiter: waiting {:?} for '{}'", wait_time, provider);
                tokio::time::sleep(wait_time).await;
            }
        }
    }

    /// Take a token if one is available right now.
    pub fn try_acquire(&self, provider: &'static str) -> bool {
        let mut buckets = self.lock_buckets();
        buckets
            .entry(provider)
            .or_insert_with(|| self.create_bucket(provider))
            .try_acquire()
    }

    fn create_bucket(&self, provider: &'static str) -> TokenBucket {
        match self.lock_limits().get(provider) {
            Some(limit) => TokenBucket::from_limit(limit),
            None => TokenBucket::from_limit(&RateLimit::default()),
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
