//! Runtime tunables for the scraping engine.
//!
//! Rate limits, breaker thresholds, and TTLs are implied tunables rather
//! than invariants: defaults are conservative (low single-digit requests
//! per minute, small failure threshold, minute-scale cool-down) pending
//! real traffic data, and every value can be overridden via environment
//! variables (see [`crate::config`]).

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Per-jurisdiction outbound request budget, per minute.
    pub rate_limit_per_minute: u32,
    /// Consecutive failures before a jurisdiction's circuit opens.
    pub breaker_failure_threshold: u32,
    /// How long an open circuit waits before admitting a probe.
    pub breaker_cooldown_secs: u64,
    /// Result-cache TTL. Registry data is volatile enough that anything
    /// beyond a few minutes mostly trades freshness for nothing.
    pub cache_ttl_secs: u64,
    /// Hard timeout on every plain HTTP request.
    pub request_timeout_secs: u64,
    /// Hard timeout on browser navigation and render waits.
    pub navigation_timeout_secs: u64,
    /// Upper bound on waiting for a rate-limit token. `None` waits
    /// indefinitely (the wait is then just a longer suspension).
    pub rate_acquire_timeout_secs: Option<u64>,
    /// Detail pages fetched concurrently per enrichment batch.
    pub detail_batch_size: usize,
    /// Pause between enrichment batches. Politeness, not correctness.
    pub detail_batch_delay_ms: u64,
    pub user_agent: String,
    /// Explicit Chrome/Chromium executable for the browser engine; when
    /// unset the driver's own discovery is used.
    pub chrome_executable: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: 6,
            breaker_failure_threshold: 4,
            breaker_cooldown_secs: 60,
            cache_ttl_secs: 900,
            request_timeout_secs: 30,
            navigation_timeout_secs: 45,
            rate_acquire_timeout_secs: Some(120),
            detail_batch_size: 3,
            detail_batch_delay_ms: 1500,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_owned(),
            chrome_executable: None,
        }
    }
}
