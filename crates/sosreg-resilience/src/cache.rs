//! TTL cache for search results.
//!
//! Pure read-through cache keyed by a canonicalized query signature. A hit
//! bypasses the rate limiter and circuit breaker entirely; a cached answer
//! is cheaper and fresher than re-deriving the same query's failure mode.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use sha2::{Digest, Sha256};

use sosreg_core::ScrapedEntity;

/// Cached outcome of one successful search.
#[derive(Debug, Clone)]
pub struct CachedSearch {
    pub entities: Vec<ScrapedEntity>,
    pub total_found: u32,
}

struct CacheEntry {
    value: CachedSearch,
    created: Instant,
}

/// In-process TTL cache, one entry per canonical query signature.
pub struct SearchCache {
    ttl: Duration,
    entries: DashMap<String, CacheEntry>,
}

impl SearchCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Canonical cache key for a query. The query string is trimmed and
    /// lowercased so `"Acme LLC"` and `" acme llc "` share an entry; the
    /// options fingerprint folds in everything that changes the result
    /// shape (limit, status filter, detail enrichment).
    #[must_use]
    pub fn key(code: &str, query: &str, options_fingerprint: &str) -> String {
        let canonical = format!(
            "{}|{}|{}",
            code.trim().to_lowercase(),
            query.trim().to_lowercase(),
            options_fingerprint
        );
        let digest = Sha256::digest(canonical.as_bytes());
        format!("{digest:x}")
    }

    /// Returns the cached value for `key` if present and unexpired.
    /// Expired entries are evicted on the way out.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<CachedSearch> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.created.elapsed() < self.ttl => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
            tracing::debug!(key, "evicted expired cache entry");
        }
        None
    }

    pub fn put(&self, key: String, value: CachedSearch) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                created: Instant::now(),
            },
        );
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
