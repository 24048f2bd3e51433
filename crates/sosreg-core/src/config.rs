//! Environment-variable loading for [`AppConfig`].

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load engine tunables from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env
/// vars. Every variable is optional; missing ones fall back to the
/// conservative defaults in [`AppConfig::default`].
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] when a set variable does not
/// parse.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load tunables from env vars already in the process, without touching
/// `.env` files. Useful for tests and callers that manage env setup.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] when a set variable does not
/// parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Core parsing logic, decoupled from the real environment so it can be
/// tested with a pure map lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = AppConfig::default();

    fn parse_set<T: std::str::FromStr>(
        var: &str,
        raw: Result<String, std::env::VarError>,
        default: T,
    ) -> Result<T, ConfigError>
    where
        T::Err: std::fmt::Display,
    {
        match raw {
            Ok(value) => value.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_owned(),
                reason: e.to_string(),
            }),
            Err(_) => Ok(default),
        }
    }

    let rate_limit_per_minute = parse_set(
        "SOSREG_RATE_LIMIT_PER_MINUTE",
        lookup("SOSREG_RATE_LIMIT_PER_MINUTE"),
        defaults.rate_limit_per_minute,
    )?;
    let breaker_failure_threshold = parse_set(
        "SOSREG_BREAKER_FAILURE_THRESHOLD",
        lookup("SOSREG_BREAKER_FAILURE_THRESHOLD"),
        defaults.breaker_failure_threshold,
    )?;
    let breaker_cooldown_secs = parse_set(
        "SOSREG_BREAKER_COOLDOWN_SECS",
        lookup("SOSREG_BREAKER_COOLDOWN_SECS"),
        defaults.breaker_cooldown_secs,
    )?;
    let cache_ttl_secs = parse_set(
        "SOSREG_CACHE_TTL_SECS",
        lookup("SOSREG_CACHE_TTL_SECS"),
        defaults.cache_ttl_secs,
    )?;
    let request_timeout_secs = parse_set(
        "SOSREG_REQUEST_TIMEOUT_SECS",
        lookup("SOSREG_REQUEST_TIMEOUT_SECS"),
        defaults.request_timeout_secs,
    )?;
    let navigation_timeout_secs = parse_set(
        "SOSREG_NAVIGATION_TIMEOUT_SECS",
        lookup("SOSREG_NAVIGATION_TIMEOUT_SECS"),
        defaults.navigation_timeout_secs,
    )?;
    // 0 disables the acquire timeout entirely.
    let rate_acquire_timeout_secs = match parse_set(
        "SOSREG_RATE_ACQUIRE_TIMEOUT_SECS",
        lookup("SOSREG_RATE_ACQUIRE_TIMEOUT_SECS"),
        defaults.rate_acquire_timeout_secs.unwrap_or(0),
    )? {
        0 => None,
        secs => Some(secs),
    };
    let detail_batch_size = parse_set(
        "SOSREG_DETAIL_BATCH_SIZE",
        lookup("SOSREG_DETAIL_BATCH_SIZE"),
        defaults.detail_batch_size,
    )?;
    let detail_batch_delay_ms = parse_set(
        "SOSREG_DETAIL_BATCH_DELAY_MS",
        lookup("SOSREG_DETAIL_BATCH_DELAY_MS"),
        defaults.detail_batch_delay_ms,
    )?;
    let user_agent = lookup("SOSREG_USER_AGENT").unwrap_or(defaults.user_agent);
    let chrome_executable = lookup("SOSREG_CHROME_EXECUTABLE").ok();

    Ok(AppConfig {
        rate_limit_per_minute,
        breaker_failure_threshold,
        breaker_cooldown_secs,
        cache_ttl_secs,
        request_timeout_secs,
        navigation_timeout_secs,
        rate_acquire_timeout_secs,
        detail_batch_size,
        detail_batch_delay_ms,
        user_agent,
        chrome_executable,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
