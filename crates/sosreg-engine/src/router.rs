//! Central entry point: jurisdiction lookup, resilience gating, engine
//! dispatch, and report assembly.
//!
//! Call order per search: cache lookup → breaker admission → rate-limit
//! acquisition → tier dispatch → breaker outcome recording → status filter
//! → optional detail enrichment → cache write. Every path, including every
//! failure, folds into a [`SearchReport`]; callers never see a raw error.

use std::sync::Arc;
use std::time::Duration;

use sosreg_core::{AppConfig, ConfigError, JurisdictionConfig, JurisdictionRegistry, ScrapeSpec, Tier};
use sosreg_resilience::{
    BreakerConfig, BreakerRegistry, CachedSearch, RateLimiterRegistry, SearchCache,
};

use crate::api::ApiEngine;
use crate::browser::BrowserEngine;
use crate::captcha::{CaptchaSolver, UnavailableSolver};
use crate::error::ScrapeError;
use crate::http::HttpEngine;
use crate::report::{RowRecord, SearchOptions, SearchReport};

pub struct RegistryRouter {
    registry: JurisdictionRegistry,
    config: AppConfig,
    cache: SearchCache,
    limiter: RateLimiterRegistry,
    breakers: BreakerRegistry,
    api: ApiEngine,
    http: HttpEngine,
    browser: BrowserEngine,
}

struct RunResult {
    entities: Vec<sosreg_core::ScrapedEntity>,
    total_found: u32,
    from_cache: bool,
}

impl RegistryRouter {
    /// Builds a router over the built-in jurisdiction table, with no
    /// captcha-solving capability (tier-4 challenges fail closed).
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Config`] if the built-in table fails
    /// validation, or [`ScrapeError::Transport`] if an HTTP client cannot
    /// be constructed.
    pub fn new(config: AppConfig) -> Result<Self, ScrapeError> {
        let registry = JurisdictionRegistry::builtin()?;
        Self::with_registry(registry, config, Arc::new(UnavailableSolver))
    }

    /// Builds a router over an explicit registry and solver. This is the
    /// seam tests and embedders use to point jurisdictions at their own
    /// endpoints or wire in a real solving backend.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Transport`] if an HTTP client cannot be
    /// constructed.
    pub fn with_registry(
        registry: JurisdictionRegistry,
        config: AppConfig,
        solver: Arc<dyn CaptchaSolver>,
    ) -> Result<Self, ScrapeError> {
        let api = ApiEngine::new(config.request_timeout_secs, &config.user_agent)?;
        let http = HttpEngine::new(config.request_timeout_secs, &config.user_agent)?;
        let browser = BrowserEngine::new(config.clone(), solver);
        Ok(Self {
            cache: SearchCache::new(Duration::from_secs(config.cache_ttl_secs)),
            limiter: RateLimiterRegistry::new(
                config.rate_limit_per_minute,
                config.rate_acquire_timeout_secs.map(Duration::from_secs),
            ),
            breakers: BreakerRegistry::new(BreakerConfig {
                failure_threshold: config.breaker_failure_threshold,
                cooldown: Duration::from_secs(config.breaker_cooldown_secs),
            }),
            registry,
            config,
            api,
            http,
            browser,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &JurisdictionRegistry {
        &self.registry
    }

    /// Forces a jurisdiction's circuit open for a full cool-down window.
    pub fn force_circuit_open(&self, code: &str) {
        self.breakers.force_open(code);
    }

    /// Searches one jurisdiction's registry for entities matching `query`.
    ///
    /// Infallible by contract: failures are reported inside the returned
    /// [`SearchReport`] with `success == false`.
    pub async fn search_entity(
        &self,
        code: &str,
        query: &str,
        options: SearchOptions,
    ) -> SearchReport {
        let started = std::time::Instant::now();
        let query = query.trim();
        tracing::info!(code, query, limit = options.limit, "search requested");

        if query.is_empty() {
            return SearchReport {
                success: false,
                jurisdiction: code.trim().to_lowercase(),
                query: String::new(),
                entities: Vec::new(),
                total_found: 0,
                duration_ms: 0,
                from_cache: false,
                error: Some("search query must not be empty".to_owned()),
            };
        }

        let result = self.run(code, query, options).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(run) => {
                tracing::info!(
                    code,
                    query,
                    returned = run.entities.len(),
                    total_found = run.total_found,
                    from_cache = run.from_cache,
                    duration_ms,
                    "search completed"
                );
                SearchReport {
                    success: true,
                    jurisdiction: code.trim().to_lowercase(),
                    query: query.to_owned(),
                    entities: run.entities,
                    total_found: run.total_found,
                    duration_ms,
                    from_cache: run.from_cache,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(code, query, error = %e, duration_ms, "search failed");
                SearchReport {
                    success: false,
                    jurisdiction: code.trim().to_lowercase(),
                    query: query.to_owned(),
                    entities: Vec::new(),
                    total_found: 0,
                    duration_ms,
                    from_cache: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn run(
        &self,
        code: &str,
        query: &str,
        options: SearchOptions,
    ) -> Result<RunResult, ScrapeError> {
        let config = self.registry.get(code)?;
        let cache_key = SearchCache::key(&config.code, query, &options.fingerprint());

        if !options.skip_cache {
            if let Some(hit) = self.cache.get(&cache_key) {
                tracing::debug!(code = %config.code, query, "cache hit");
                return Ok(RunResult {
                    entities: hit.entities,
                    total_found: hit.total_found,
                    from_cache: true,
                });
            }
        }

        self.breakers.check(&config.code)?;
        self.limiter.acquire(&config.code).await?;

        let outcome = self.execute(config, query, &options).await;
        let outcome = match outcome {
            Ok(outcome) => {
                self.breakers.record_success(&config.code);
                outcome
            }
            Err(e) => {
                if e.is_breaker_failure() {
                    self.breakers.record_failure(&config.code);
                }
                return Err(e);
            }
        };

        // Tier 1 filters server-side; post-filtering keeps one contract
        // across tiers and is a no-op there.
        let mut rows: Vec<RowRecord> = outcome
            .rows
            .into_iter()
            .filter(|row| options.status.admits(row.entity.status.as_deref()))
            .collect();
        rows.truncate(options.limit);

        let entities = if options.include_details {
            self.enrich(config, rows).await
        } else {
            rows.into_iter().map(|row| row.entity).collect()
        };

        self.cache.put(
            cache_key,
            CachedSearch {
                entities: entities.clone(),
                total_found: outcome.total_found,
            },
        );

        Ok(RunResult {
            entities,
            total_found: outcome.total_found,
            from_cache: false,
        })
    }

    async fn execute(
        &self,
        config: &JurisdictionConfig,
        query: &str,
        options: &SearchOptions,
    ) -> Result<crate::report::SearchOutcome, ScrapeError> {
        if let (Tier::OpenApi, Some(api)) = (config.tier, &config.api) {
            return self.api.search(config, api, query, options).await;
        }
        if let Some(spec) = &config.scrape {
            if needs_browser(config, spec) {
                return self.browser.search(config, spec, query, options).await;
            }
            return self.http.search(config, spec, query, options).await;
        }
        // Registry validation rules this out for any config it accepted.
        Err(ScrapeError::Config(ConfigError::InvalidJurisdiction {
            code: config.code.clone(),
            violations: vec!["no executable tier spec".to_owned()],
        }))
    }

    /// Detail enrichment: fetches detail pages in small concurrent batches
    /// with a politeness pause between batches. A failed detail fetch keeps
    /// the original search-result entity and does not count against the
    /// breaker; partial enrichment beats a failed search.
    ///
    /// Detail fetches ride on the search's rate-limit token; the batch
    /// size and pause are the throttle here.
    async fn enrich(
        &self,
        config: &JurisdictionConfig,
        rows: Vec<RowRecord>,
    ) -> Vec<sosreg_core::ScrapedEntity> {
        let Some(spec) = &config.scrape else {
            return rows.into_iter().map(|row| row.entity).collect();
        };
        if spec.detail.is_none() {
            return rows.into_iter().map(|row| row.entity).collect();
        }

        let batch_size = self.config.detail_batch_size.max(1);
        let batches = rows.len().div_ceil(batch_size);
        let mut entities = Vec::with_capacity(rows.len());

        for (index, chunk) in rows.chunks(batch_size).enumerate() {
            let fetches = chunk.iter().map(|row| self.enrich_row(config, spec, row));
            entities.extend(futures::future::join_all(fetches).await);
            if index + 1 < batches {
                tokio::time::sleep(Duration::from_millis(self.config.detail_batch_delay_ms)).await;
            }
        }
        entities
    }

    async fn enrich_row(
        &self,
        config: &JurisdictionConfig,
        spec: &ScrapeSpec,
        row: &RowRecord,
    ) -> sosreg_core::ScrapedEntity {
        let Some(url) = row.detail_url.as_deref() else {
            return row.entity.clone();
        };
        let fetched = if needs_browser(config, spec) {
            self.browser.fetch_detail(config, spec, url).await
        } else {
            self.http.fetch_detail(config, spec, url).await
        };
        match fetched {
            Ok(detail) => row.entity.merged_with(detail),
            Err(e) => {
                tracing::warn!(
                    code = %config.code,
                    url,
                    error = %e,
                    "detail fetch failed, keeping search-result entity"
                );
                row.entity.clone()
            }
        }
    }
}

/// Script-rendered and captcha-protected tiers always need the browser; a
/// nominally static jurisdiction that flips on `requires_js` routes there
/// too.
fn needs_browser(config: &JurisdictionConfig, spec: &ScrapeSpec) -> bool {
    config.tier.needs_browser() || spec.requires_js
}
