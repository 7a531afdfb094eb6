//! Geocoding backend orchestration.
//!
//! - `health` - rolling failure windows that pick the backend order
//! - `rate_limiter` - per-backend token buckets
//! - `gateway` - failover routing that ties the two together

mod gateway;
mod health;
mod rate_limiter;

pub use gateway::GeocodingGateway;
pub use health::{HealthConfig, HealthTracker, ProviderHealthSnapshot};
pub use rate_limiter::RateLimiter;
