//! Per-jurisdiction circuit breakers.
//!
//! Scraping targets are third-party government sites with no SLA. Without
//! isolation, one unreachable registry would burn timeouts for every
//! concurrent caller touching it; the breaker turns that into an immediate
//! typed rejection instead.
//!
//! State machine per jurisdiction: Closed (requests flow) → Open after
//! `failure_threshold` consecutive failures (requests short-circuit) →
//! HalfOpen once the cool-down elapses (exactly one probe admitted; other
//! callers keep getting rejected until the probe reports). Probe success
//! closes the circuit and zeroes the failure counter; probe failure reopens
//! it and restarts the cool-down. A probe that never reports (cancelled
//! future, caller failed before executing) goes stale after one more
//! cool-down and a replacement probe is admitted, so an abandoned probe
//! cannot wedge the circuit open until restart.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::ResilienceError;

#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 4,
            cooldown: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
enum State {
    Closed,
    Open { until: Instant },
    /// One probe admitted at `since`; everyone else is rejected until it
    /// reports, or until another cool-down elapses and the probe is
    /// presumed abandoned.
    HalfOpen { since: Instant },
}

#[derive(Debug)]
struct Breaker {
    state: State,
    consecutive_failures: u32,
    last_failure_at: Option<Instant>,
}

impl Default for Breaker {
    fn default() -> Self {
        Self {
            state: State::Closed,
            consecutive_failures: 0,
            last_failure_at: None,
        }
    }
}

/// Registry of one breaker per jurisdiction code, created lazily on first
/// use. Transitions for a single jurisdiction are linearized under the
/// map's shard lock; different jurisdictions do not contend.
pub struct BreakerRegistry {
    config: BreakerConfig,
    breakers: DashMap<String, Breaker>,
}

impl BreakerRegistry {
    #[must_use]
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Admission check, run before any network action.
    ///
    /// # Errors
    ///
    /// Returns [`ResilienceError::CircuitOpen`] when the circuit is open or
    /// a half-open probe is already in flight. No failure is recorded for a
    /// rejected call; an open breaker is already-known information.
    pub fn check(&self, code: &str) -> Result<(), ResilienceError> {
        let mut entry = self.breakers.entry(code.to_owned()).or_default();
        match entry.state {
            State::Closed => Ok(()),
            State::Open { until } => {
                let now = Instant::now();
                if now >= until {
                    tracing::info!(code, "circuit half-open, admitting probe");
                    entry.state = State::HalfOpen { since: now };
                    Ok(())
                } else {
                    Err(ResilienceError::CircuitOpen {
                        code: code.to_owned(),
                        retry_in: until - now,
                    })
                }
            }
            State::HalfOpen { since } => {
                let now = Instant::now();
                let pending_for = now.duration_since(since);
                if pending_for >= self.config.cooldown {
                    // The admitted probe never reported; presume it
                    // abandoned and hand the slot to this caller.
                    tracing::warn!(code, "probe went stale, admitting replacement probe");
                    entry.state = State::HalfOpen { since: now };
                    Ok(())
                } else {
                    Err(ResilienceError::CircuitOpen {
                        code: code.to_owned(),
                        retry_in: self.config.cooldown - pending_for,
                    })
                }
            }
        }
    }

    /// Records a successful execution. Closes a half-open circuit and
    /// zeroes the consecutive-failure counter.
    pub fn record_success(&self, code: &str) {
        let mut entry = self.breakers.entry(code.to_owned()).or_default();
        if matches!(entry.state, State::HalfOpen { .. }) {
            tracing::info!(code, "probe succeeded, closing circuit");
        }
        entry.state = State::Closed;
        entry.consecutive_failures = 0;
        entry.last_failure_at = None;
    }

    /// Records a failed execution. Opens the circuit after
    /// `failure_threshold` consecutive failures, and immediately reopens a
    /// half-open circuit on probe failure.
    pub fn record_failure(&self, code: &str) {
        let mut entry = self.breakers.entry(code.to_owned()).or_default();
        entry.consecutive_failures += 1;
        entry.last_failure_at = Some(Instant::now());
        let failures = entry.consecutive_failures;

        let should_open = match entry.state {
            State::HalfOpen { .. } => {
                tracing::warn!(code, "probe failed, reopening circuit");
                true
            }
            State::Closed if failures >= self.config.failure_threshold => {
                tracing::warn!(
                    code,
                    failures,
                    threshold = self.config.failure_threshold,
                    "failure threshold reached, opening circuit"
                );
                true
            }
            _ => false,
        };

        if should_open {
            entry.state = State::Open {
                until: Instant::now() + self.config.cooldown,
            };
        }
    }

    /// Forces a jurisdiction's circuit open for a full cool-down window.
    /// Operational override, also used by tests.
    pub fn force_open(&self, code: &str) {
        let mut entry = self.breakers.entry(code.to_owned()).or_default();
        entry.state = State::Open {
            until: Instant::now() + self.config.cooldown,
        };
    }

    /// Whether a call to `code` would currently be admitted, without
    /// mutating state (an elapsed cool-down still reports `false` here; the
    /// half-open transition happens in [`Self::check`]).
    #[must_use]
    pub fn is_closed(&self, code: &str) -> bool {
        self.breakers
            .get(code)
            .is_none_or(|entry| matches!(entry.state, State::Closed))
    }
}
