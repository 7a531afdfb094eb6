//! Rate limiting configuration declared by each geocoding backend.

/// Rate limiting configuration for a provider.
///
/// Controls how aggressively we can call a backend without breaching its
/// usage policy.
#[derive(Clone, Debug)]
pub struct RateLimit {
    /// Maximum requests allowed per minute.
    pub requests_per_minute: u32,

    /// Requests allowed back to back before the per-minute rate applies.
    pub burst: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            burst: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_one_request_per_second() {
        let limit = RateLimit::default();
        assert_eq!(limit.requests_per_minute, 60);
        assert_eq!(limit.burst, 1);
    }
}
