//! Rolling failure counters that bias which geocoding backend goes first.
//!
//! Unlike a circuit breaker nothing is ever blocked: an unhealthy backend is
//! only moved to the back of the order, so both are still tried when both are
//! failing. Counters are in-memory and start from zero on restart.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Serialize;

use crate::models::ProviderKind;

/// Failures within one window before a backend is considered unhealthy.
const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Length of the failure window.
const DEFAULT_RESET_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct HealthConfig {
    pub failure_threshold: u32,
    /// A window older than this is cleared on the next check.
    pub reset_interval: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_interval: DEFAULT_RESET_INTERVAL,
        }
    }
}

#[derive(Debug)]
struct Window {
    failure_count: u32,
    started_at: Instant,
}

impl Window {
    fn new() -> Self {
        Self {
            failure_count: 0,
            started_at: Instant::now(),
        }
    }
}

/// Point-in-time view of one backend's health.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHealthSnapshot {
    pub provider: ProviderKind,
    pub failure_count: u32,
    pub healthy: bool,
}

/// Per-backend failure windows.
///
/// Shared between concurrent lookups; every read and update happens under a
/// single lock so the window reset and the counter change are atomic.
pub struct HealthTracker {
    windows: Mutex<HashMap<ProviderKind, Window>>,
    config: HealthConfig,
    secondary_enabled: bool,
}

impl HealthTracker {
    /// `secondary_enabled` is false when the secondary backend has no
    /// credentials, in which case it never appears in the order.
    pub fn new(config: HealthConfig, secondary_enabled: bool) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            config,
            secondary_enabled,
        }
    }

    pub fn with_defaults(secondary_enabled: bool) -> Self {
        Self::new(HealthConfig::default(), secondary_enabled)
    }

    fn lock_windows(&self) -> MutexGuard<'_, HashMap<ProviderKind, Window>> {
        self.windows.lock().unwrap_or_else(|poisoned| {
            warn!("Health tracker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Fetch the window for `kind`, restarting it when it has expired.
    fn checked_window<'a>(
        &self,
        windows: &'a mut HashMap<ProviderKind, Window>,
        kind: ProviderKind,
    ) -> &'a mut Window {
        let window = windows.entry(kind).or_insert_with(Window::new);
        if window.started_at.elapsed() > self.config.reset_interval {
            if window.failure_count > 0 {
                info!(
                    "Health window expired for {} backend, clearing {} failures",
                    kind, window.failure_count
                );
            }
            *window = Window::new();
        }
        window
    }

    pub fn record_failure(&self, kind: ProviderKind) {
        let mut windows = self.lock_windows();
        let window = self.checked_window(&mut windows, kind);
        window.failure_count += 1;
        debug!(
            "Recorded failure for {} backend ({}/{})",
            kind, window.failure_count, self.config.failure_threshold
        );
    }

    /// Successes leave the counter alone; they only advance the window check.
    pub fn record_success(&self, kind: ProviderKind) {
        let mut windows = self.lock_windows();
        self.checked_window(&mut windows, kind);
    }

    pub fn failure_count(&self, kind: ProviderKind) -> u32 {
        let mut windows = self.lock_windows();
        self.checked_window(&mut windows, kind).failure_count
    }

    pub fn is_secondary_enabled(&self) -> bool {
        self.secondary_enabled
    }

    /// Backends to try, best first.
    ///
    /// The secondary goes first only when the primary has reached the failure
    /// threshold and the secondary has not. Every other combination keeps the
    /// default order.
    pub fn order(&self) -> Vec<ProviderKind> {
        if !self.secondary_enabled {
            return vec![ProviderKind::Primary];
        }

        let mut windows = self.lock_windows();
        let threshold = self.config.failure_threshold;
        let primary = self
            .checked_window(&mut windows, ProviderKind::Primary)
            .failure_count;
        let secondary = self
            .checked_window(&mut windows, ProviderKind::Secondary)
            .failure_count;

        if primary >= threshold && secondary < threshold {
            debug!("Primary backend unhealthy ({} failures), preferring secondary", primary);
            vec![ProviderKind::Secondary, ProviderKind::Primary]
        } else {
            vec![ProviderKind::Primary, ProviderKind::Secondary]
        }
    }

    /// Health of every enabled backend.
    pub fn snapshot(&self) -> Vec<ProviderHealthSnapshot> {
        let mut windows = self.lock_windows();
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| *kind == ProviderKind::Primary || self.secondary_enabled)
            .map(|kind| {
                let failure_count = self.checked_window(&mut windows, kind).failure_count;
                ProviderHealthSnapshot {
                    provider: kind,
                    failure_count,
                    healthy: failure_count < self.config.failure_threshold,
                }
            })
            .collect()
    }

    /// Forget all failures.
    pub fn reset(&self) {
        self.lock_windows().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn short_window() -> HealthConfig {
        HealthConfig {
            failure_threshold: 3,
            reset_interval: Duration::from_millis(50),
        }
    }

    #[test]
    fn test_default_order() {
        let tracker = HealthTracker::with_defaults(true);
        assert_eq!(
            tracker.order(),
            vec![ProviderKind::Primary, ProviderKind::Secondary]
        );
    }

    #[test]
    fn test_disabled_secondary_is_never_ordered() {
        let tracker = HealthTracker::with_defaults(false);
        for _ in 0..5 {
            tracker.record_failure(ProviderKind::Primary);
        }
        assert_eq!(tracker.order(), vec![ProviderKind::Primary]);
        assert_eq!(tracker.snapshot().len(), 1);
    }

    #[test]
    fn test_unhealthy_primary_moves_back() {
        let tracker = HealthTracker::with_defaults(true);

        tracker.record_failure(ProviderKind::Primary);
        tracker.record_failure(ProviderKind::Primary);
        assert_eq!(tracker.order()[0], ProviderKind::Primary);

        tracker.record_failure(ProviderKind::Primary);
        assert_eq!(
            tracker.order(),
            vec![ProviderKind::Secondary, ProviderKind::Primary]
        );
    }

    #[test]
    fn test_both_unhealthy_keeps_default_order() {
        let tracker = HealthTracker::with_defaults(true);
        for _ in 0..3 {
            tracker.record_failure(ProviderKind::Primary);
            tracker.record_failure(ProviderKind::Secondary);
        }
        assert_eq!(
            tracker.order(),
            vec![ProviderKind::Primary, ProviderKind::Secondary]
        );
    }

    #[test]
    fn test_unhealthy_secondary_keeps_default_order() {
        let tracker = HealthTracker::with_defaults(true);
        for _ in 0..3 {
            tracker.record_failure(ProviderKind::Secondary);
        }
        assert_eq!(tracker.order()[0], ProviderKind::Primary);
    }

    #[test]
    fn test_success_does_not_clear_failures() {
        let tracker = HealthTracker::with_defaults(true);
        tracker.record_failure(ProviderKind::Primary);
        tracker.record_success(ProviderKind::Primary);
        assert_eq!(tracker.failure_count(ProviderKind::Primary), 1);
    }

    #[test]
    fn test_window_expiry_resets_count() {
        let tracker = HealthTracker::new(short_window(), true);
        for _ in 0..3 {
            tracker.record_failure(ProviderKind::Primary);
        }
        assert_eq!(tracker.order()[0], ProviderKind::Secondary);

        thread::sleep(Duration::from_millis(80));

        assert_eq!(tracker.failure_count(ProviderKind::Primary), 0);
        assert_eq!(tracker.order()[0], ProviderKind::Primary);
    }

    #[test]
    fn test_failure_after_expiry_starts_new_window() {
        let tracker = HealthTracker::new(short_window(), true);
        tracker.record_failure(ProviderKind::Primary);
        tracker.record_failure(ProviderKind::Primary);

        thread::sleep(Duration::from_millis(80));
        tracker.record_failure(ProviderKind::Primary);

        assert_eq!(tracker.failure_count(ProviderKind::Primary), 1);
    }

    #[test]
    fn test_snapshot_and_reset() {
        let tracker = HealthTracker::with_defaults(true);
        for _ in 0..3 {
            tracker.record_failure(ProviderKind::Secondary);
        }

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot[0].healthy);
        assert_eq!(snapshot[1].provider, ProviderKind::Secondary);
        assert_eq!(snapshot[1].failure_count, 3);
        assert!(!snapshot[1].healthy);

        tracker.reset();
        assert!(tracker.snapshot().iter().all(|s| s.failure_count == 0));
    }
}
