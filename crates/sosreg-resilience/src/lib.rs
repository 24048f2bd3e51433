//! Per-jurisdiction resilience services: rate limiting, circuit breaking,
//! and result caching.
//!
//! The three services are independently usable; the router composes them in
//! a fixed order (cache lookup → breaker admission → rate-limit acquisition
//! → execution → breaker outcome recording → cache write). State is held
//! per jurisdiction key in sharded maps, so operations against different
//! jurisdictions never serialize against each other.

pub mod breaker;
pub mod cache;
pub mod rate_limit;

use std::time::Duration;

use thiserror::Error;

pub use breaker::{BreakerConfig, BreakerRegistry};
pub use cache::{CachedSearch, SearchCache};
pub use rate_limit::RateLimiterRegistry;

#[derive(Debug, Error)]
pub enum ResilienceError {
    #[error("circuit open for {code} (retry in {}s)", retry_in.as_secs())]
    CircuitOpen { code: String, retry_in: Duration },

    #[error("rate-limit acquisition for {code} timed out after {}s", waited.as_secs())]
    AcquireTimeout { code: String, waited: Duration },
}
