use thiserror::Error;

use sosreg_resilience::ResilienceError;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Config(#[from] sosreg_core::ConfigError),

    #[error("circuit open for {code} (retry in {retry_in_secs}s)")]
    CircuitOpen { code: String, retry_in_secs: u64 },

    #[error("rate-limit wait for {code} timed out after {waited_secs}s")]
    RateLimitTimeout { code: String, waited_secs: u64 },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no entity name resolvable from {url}")]
    Parse { url: String },

    #[error("browser failure for {code}: {reason}")]
    Browser { code: String, reason: String },

    #[error("captcha challenge unresolved for {code}: {reason}")]
    ChallengeUnresolved { code: String, reason: String },
}

impl ScrapeError {
    /// Whether this failure should count against the jurisdiction's circuit
    /// breaker.
    ///
    /// Target-side failures (network, bad status, unparseable response,
    /// browser breakage, unsolved challenges) count. Config errors are not
    /// the target site's fault, an open circuit is already-known
    /// information, and a rate-limit timeout is our own throttle — none of
    /// those are recorded.
    #[must_use]
    pub fn is_breaker_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::UnexpectedStatus { .. }
                | Self::Deserialize { .. }
                | Self::Parse { .. }
                | Self::Browser { .. }
                | Self::ChallengeUnresolved { .. }
        )
    }
}

impl From<ResilienceError> for ScrapeError {
    fn from(err: ResilienceError) -> Self {
        match err {
            ResilienceError::CircuitOpen { code, retry_in } => Self::CircuitOpen {
                code,
                retry_in_secs: retry_in.as_secs(),
            },
            ResilienceError::AcquireTimeout { code, waited } => Self::RateLimitTimeout {
                code,
                waited_secs: waited.as_secs(),
            },
        }
    }
}
