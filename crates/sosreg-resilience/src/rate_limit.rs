//! Per-jurisdiction token-bucket rate limiting.
//!
//! Every jurisdiction gets its own bucket sized to the configured
//! requests-per-minute budget, refilled continuously. [`RateLimiterRegistry::acquire`]
//! suspends the calling task until a token is available rather than
//! failing, so callers queue on token availability with no fairness
//! guarantee beyond that. The bucket state is locked per jurisdiction;
//! waiting happens outside the lock.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::ResilienceError;

#[derive(Debug)]
struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(per_minute: u32) -> Self {
        let capacity = f64::from(per_minute.max(1));
        Self {
            capacity,
            // A fresh bucket starts full so the first burst is not delayed.
            tokens: capacity,
            refill_per_sec: capacity / 60.0,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    /// Takes a token if available, otherwise returns how long until one
    /// accrues.
    fn try_take(&mut self) -> Result<(), Duration> {
        self.refill(Instant::now());
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - self.tokens;
            Err(Duration::from_secs_f64(deficit / self.refill_per_sec))
        }
    }
}

/// One token bucket per jurisdiction code, created lazily on first use.
pub struct RateLimiterRegistry {
    per_minute: u32,
    /// Bounds how long [`Self::acquire`] may suspend; `None` waits
    /// indefinitely.
    acquire_timeout: Option<Duration>,
    buckets: DashMap<String, Arc<Mutex<TokenBucket>>>,
}

impl RateLimiterRegistry {
    #[must_use]
    pub fn new(per_minute: u32, acquire_timeout: Option<Duration>) -> Self {
        Self {
            per_minute,
            acquire_timeout,
            buckets: DashMap::new(),
        }
    }

    fn bucket(&self, code: &str) -> Arc<Mutex<TokenBucket>> {
        self.buckets
            .entry(code.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(TokenBucket::new(self.per_minute))))
            .clone()
    }

    /// Suspends until a token for `code` is available, then consumes it.
    ///
    /// # Errors
    ///
    /// Returns [`ResilienceError::AcquireTimeout`] only when an acquire
    /// timeout is configured and elapses first; an unbounded acquire never
    /// fails, it just suspends longer.
    pub async fn acquire(&self, code: &str) -> Result<(), ResilienceError> {
        let bucket = self.bucket(code);
        let started = Instant::now();

        loop {
            let wait = {
                let mut bucket = bucket.lock().await;
                match bucket.try_take() {
                    Ok(()) => return Ok(()),
                    Err(wait) => wait,
                }
            };

            if let Some(timeout) = self.acquire_timeout {
                let waited = started.elapsed();
                if waited + wait > timeout {
                    tracing::warn!(
                        code,
                        waited_ms = waited.as_millis() as u64,
                        "rate-limit acquire timed out"
                    );
                    return Err(ResilienceError::AcquireTimeout {
                        code: code.to_owned(),
                        waited,
                    });
                }
            }

            tracing::debug!(code, wait_ms = wait.as_millis() as u64, "rate limited, waiting");
            tokio::time::sleep(wait).await;
        }
    }
}
