//! Tier-3/4 execution: stealth headless-browser sessions.
//!
//! Target pages render their search UIs with JavaScript, so a plain fetch
//! returns an empty shell. This engine drives a shared headless Chromium
//! through one scrape session per call: Navigate → WaitReady → FillForm →
//! Submit → (Challenge, tier 4) → WaitForResults → Parse. Parsing feeds the
//! rendered-DOM snapshot through the same selector-engine extraction the
//! HTTP engine uses.
//!
//! Interaction is deliberately human-paced — per-character typing with
//! jittered delays and randomized pauses — to keep automated-traffic
//! fingerprints down on sites with anti-bot defenses.
//!
//! Pages are closed on every exit path; browser contexts are expensive
//! OS-level resources.

use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat,
};
use chromiumoxide::page::Page;
use chromiumoxide::Element;
use futures::StreamExt;
use rand::Rng;
use tokio::sync::OnceCell;
use tokio::time::{sleep, timeout};

use sosreg_core::entity::DetailRecord;
use sosreg_core::{AppConfig, CaptchaSpec, JurisdictionConfig, ScrapeSpec, SubmitMethod};

use crate::captcha::{CaptchaChallenge, CaptchaSolver};
use crate::error::ScrapeError;
use crate::extract::{parse_detail_page, parse_search_results};
use crate::report::{SearchOptions, SearchOutcome};

/// Pagination guard for next-page clicking, mirroring the HTTP engine.
const MAX_PAGES: usize = 3;

/// Poll interval while waiting for a locator to appear.
const WAIT_POLL_MS: u64 = 250;

/// Masks the most common headless fingerprints before any page script runs.
const STEALTH_INIT_JS: &str = r"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3] });
window.chrome = window.chrome || { runtime: {} };
";

pub struct BrowserEngine {
    config: AppConfig,
    solver: Arc<dyn CaptchaSolver>,
    browser: OnceCell<Browser>,
}

impl BrowserEngine {
    #[must_use]
    pub fn new(config: AppConfig, solver: Arc<dyn CaptchaSolver>) -> Self {
        Self {
            config,
            solver,
            browser: OnceCell::new(),
        }
    }

    /// Launches the shared stealth browser on first use.
    async fn browser(&self) -> Result<&Browser, ScrapeError> {
        self.browser
            .get_or_try_init(|| async {
                let mut rng = rand::rng();
                let width = rng.random_range(1280..1680);
                let height = rng.random_range(800..1050);
                drop(rng);

                let mut builder = BrowserConfig::builder()
                    .window_size(width, height)
                    .arg("--headless=new")
                    .arg("--disable-gpu")
                    .arg("--no-sandbox")
                    .arg("--disable-dev-shm-usage")
                    .arg("--disable-extensions")
                    .arg("--disable-background-networking")
                    .arg("--disable-blink-features=AutomationControlled")
                    .arg(format!("--user-agent={}", self.config.user_agent));
                if let Some(path) = &self.config.chrome_executable {
                    builder = builder.chrome_executable(path);
                }
                let browser_config = builder.build().map_err(|e| ScrapeError::Browser {
                    code: "launch".to_owned(),
                    reason: format!("browser config: {e}"),
                })?;

                let (browser, mut handler) =
                    Browser::launch(browser_config)
                        .await
                        .map_err(|e| ScrapeError::Browser {
                            code: "launch".to_owned(),
                            reason: e.to_string(),
                        })?;

                tokio::spawn(async move {
                    while let Some(event) = handler.next().await {
                        let _ = event;
                    }
                });

                tracing::info!(width, height, "launched stealth browser");
                Ok(browser)
            })
            .await
    }

    /// Runs one search session. The page is torn down on success and on
    /// every failure path.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::Browser`] — navigation, interaction, or driver
    ///   failure (timeouts included).
    /// - [`ScrapeError::ChallengeUnresolved`] — tier 4 challenge detected
    ///   and the solver failed or is unavailable.
    pub async fn search(
        &self,
        config: &JurisdictionConfig,
        spec: &ScrapeSpec,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchOutcome, ScrapeError> {
        let page = self.open_page(config).await?;
        let result = self.run_search(&page, config, spec, query, options).await;
        Self::teardown(page, &config.code).await;
        result
    }

    /// Navigates to one detail page and extracts a partial record.
    ///
    /// # Errors
    ///
    /// Same failure surface as [`Self::search`], minus the challenge path.
    pub async fn fetch_detail(
        &self,
        config: &JurisdictionConfig,
        spec: &ScrapeSpec,
        url: &str,
    ) -> Result<DetailRecord, ScrapeError> {
        let page = self.open_page(config).await?;
        let result = async {
            self.navigate(&page, config, url).await?;
            self.wait_ready(&page, config, spec, false).await?;
            let html = self.page_html(&page, config).await?;
            Ok(parse_detail_page(&html, spec, url))
        }
        .await;
        Self::teardown(page, &config.code).await;
        result
    }

    async fn open_page(&self, config: &JurisdictionConfig) -> Result<Page, ScrapeError> {
        let browser = self.browser().await?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| self.err(config, e))?;
        let script = AddScriptToEvaluateOnNewDocumentParams::builder()
            .source(STEALTH_INIT_JS)
            .build()
            .map_err(|e| ScrapeError::Browser {
                code: config.code.clone(),
                reason: format!("stealth init script: {e}"),
            })?;
        page.execute(script).await.map_err(|e| self.err(config, e))?;
        Ok(page)
    }

    async fn run_search(
        &self,
        page: &Page,
        config: &JurisdictionConfig,
        spec: &ScrapeSpec,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchOutcome, ScrapeError> {
        self.navigate(page, config, &spec.search_url).await?;
        self.wait_ready(page, config, spec, false).await?;
        self.fill_form(page, config, spec, query).await?;
        self.submit(page, config, spec).await?;
        self.wait_for_results(page, config, spec).await?;

        if let Some(captcha) = &spec.captcha {
            if let Some(challenge_element) = self.detect_challenge(page, captcha).await {
                self.resolve_challenge(page, config, spec, captcha, &challenge_element)
                    .await?;
                self.wait_for_results(page, config, spec).await?;
            }
        }

        let mut rows = Vec::new();
        let mut total_found = 0u32;
        for page_index in 0..MAX_PAGES {
            let html = self.page_html(page, config).await?;
            let remaining = options.limit.saturating_sub(rows.len());
            let parsed =
                parse_search_results(&html, spec, &config.code, &spec.search_url, remaining);
            if page_index == 0 {
                if parsed.selectors_missed() {
                    return Err(ScrapeError::Parse {
                        url: spec.search_url.clone(),
                    });
                }
                total_found = parsed.total_found;
            }
            rows.extend(parsed.rows);

            let Some(next_locator) = spec.results.next_page.as_ref() else {
                break;
            };
            if rows.len() >= options.limit {
                break;
            }
            let Ok(next) = page.find_element(next_locator.primary.as_str()).await else {
                break;
            };
            tracing::debug!(code = %config.code, page = page_index + 2, "clicking next page");
            next.click().await.map_err(|e| self.err(config, e))?;
            self.wait_for_results(page, config, spec).await?;
        }

        Ok(SearchOutcome { rows, total_found })
    }

    async fn navigate(
        &self,
        page: &Page,
        config: &JurisdictionConfig,
        url: &str,
    ) -> Result<(), ScrapeError> {
        let nav_timeout = Duration::from_secs(self.config.navigation_timeout_secs);
        tracing::debug!(code = %config.code, url, "navigating");
        match timeout(nav_timeout, page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(self.err(config, e)),
            Err(_) => Err(ScrapeError::Browser {
                code: config.code.clone(),
                reason: format!("navigation to {url} timed out"),
            }),
        }
    }

    /// WaitReady: navigation settle, optional explicit locator, the
    /// post-submit settle delay when one applies to this phase, and a
    /// small randomized human pause.
    async fn wait_ready(
        &self,
        page: &Page,
        config: &JurisdictionConfig,
        spec: &ScrapeSpec,
        after_submit: bool,
    ) -> Result<(), ScrapeError> {
        let nav_timeout = Duration::from_secs(self.config.navigation_timeout_secs);
        // Best effort: some single-page registries never fire another
        // navigation event after the initial load.
        let _ = timeout(nav_timeout, page.wait_for_navigation()).await;

        if let Some(locator) = &spec.wait_for {
            self.wait_for_locator(page, config, locator).await?;
        }
        if let Some(delay) = settle_delay(spec, after_submit) {
            sleep(delay).await;
        }
        human_pause(300, 900).await;
        Ok(())
    }

    async fn wait_for_results(
        &self,
        page: &Page,
        config: &JurisdictionConfig,
        spec: &ScrapeSpec,
    ) -> Result<(), ScrapeError> {
        self.wait_ready(page, config, spec, true).await
    }

    /// Polls for a locator until the navigation timeout elapses.
    async fn wait_for_locator(
        &self,
        page: &Page,
        config: &JurisdictionConfig,
        locator: &str,
    ) -> Result<(), ScrapeError> {
        let deadline =
            tokio::time::Instant::now() + Duration::from_secs(self.config.navigation_timeout_secs);
        loop {
            if page.find_element(locator).await.is_ok() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ScrapeError::Browser {
                    code: config.code.clone(),
                    reason: format!("timed out waiting for \"{locator}\""),
                });
            }
            sleep(Duration::from_millis(WAIT_POLL_MS)).await;
        }
    }

    async fn fill_form(
        &self,
        page: &Page,
        config: &JurisdictionConfig,
        spec: &ScrapeSpec,
        query: &str,
    ) -> Result<(), ScrapeError> {
        for field in &spec.form_fields {
            let element = page
                .find_element(field.locator.as_str())
                .await
                .map_err(|e| self.err(config, e))?;
            element.click().await.map_err(|e| self.err(config, e))?;
            type_human(&element, &field.resolved_value(query))
                .await
                .map_err(|e| self.err(config, e))?;
            human_pause(120, 400).await;
        }
        Ok(())
    }

    async fn submit(
        &self,
        page: &Page,
        config: &JurisdictionConfig,
        spec: &ScrapeSpec,
    ) -> Result<(), ScrapeError> {
        match spec.submit {
            SubmitMethod::Click => {
                // Validation guarantees the locator is present for Click.
                let locator = spec.submit_locator.as_deref().unwrap_or_default();
                let button = page
                    .find_element(locator)
                    .await
                    .map_err(|e| self.err(config, e))?;
                button.click().await.map_err(|e| self.err(config, e))?;
            }
            SubmitMethod::PressEnter => {
                let Some(field) = spec.form_fields.last() else {
                    return Err(ScrapeError::Browser {
                        code: config.code.clone(),
                        reason: "press-enter submit with no form fields".to_owned(),
                    });
                };
                let element = page
                    .find_element(field.locator.as_str())
                    .await
                    .map_err(|e| self.err(config, e))?;
                element
                    .press_key("Enter")
                    .await
                    .map_err(|e| self.err(config, e))?;
            }
            SubmitMethod::FormSubmit => {
                page.evaluate("document.forms[0] && document.forms[0].submit()")
                    .await
                    .map_err(|e| self.err(config, e))?;
            }
        }
        tracing::debug!(code = %config.code, method = ?spec.submit, "submitted search form");
        Ok(())
    }

    /// A present challenge image means we are being challenged.
    async fn detect_challenge(&self, page: &Page, captcha: &CaptchaSpec) -> Option<Element> {
        page.find_element(captcha.image_locator.as_str()).await.ok()
    }

    /// Hands the challenge artifact to the solving collaborator and
    /// resubmits with the returned token. Fails closed: an unsolved
    /// challenge is an error, never a silently-empty result.
    async fn resolve_challenge(
        &self,
        page: &Page,
        config: &JurisdictionConfig,
        spec: &ScrapeSpec,
        captcha: &CaptchaSpec,
        challenge_element: &Element,
    ) -> Result<(), ScrapeError> {
        tracing::info!(code = %config.code, "captcha challenge detected");
        let image_png = challenge_element
            .screenshot(CaptureScreenshotFormat::Png)
            .await
            .map_err(|e| self.err(config, e))?;

        let token = self
            .solver
            .solve(CaptchaChallenge {
                jurisdiction: config.code.clone(),
                image_png,
            })
            .await
            .map_err(|e| ScrapeError::ChallengeUnresolved {
                code: config.code.clone(),
                reason: e.to_string(),
            })?;

        let input = page
            .find_element(captcha.input_locator.as_str())
            .await
            .map_err(|e| self.err(config, e))?;
        input.click().await.map_err(|e| self.err(config, e))?;
        type_human(&input, &token)
            .await
            .map_err(|e| self.err(config, e))?;

        match &captcha.submit_locator {
            Some(locator) => {
                let button = page
                    .find_element(locator.as_str())
                    .await
                    .map_err(|e| self.err(config, e))?;
                button.click().await.map_err(|e| self.err(config, e))?;
            }
            // No dedicated challenge submit: resubmit the main form.
            None => self.submit(page, config, spec).await?,
        }
        tracing::info!(code = %config.code, "captcha token submitted");
        Ok(())
    }

    async fn page_html(
        &self,
        page: &Page,
        config: &JurisdictionConfig,
    ) -> Result<String, ScrapeError> {
        page.content().await.map_err(|e| self.err(config, e))
    }

    async fn teardown(page: Page, code: &str) {
        if let Err(e) = page.close().await {
            tracing::warn!(code, error = %e, "failed to close browser page");
        }
    }

    fn err(&self, config: &JurisdictionConfig, e: impl std::fmt::Display) -> ScrapeError {
        ScrapeError::Browser {
            code: config.code.clone(),
            reason: e.to_string(),
        }
    }
}

/// Types a value one character at a time with jittered inter-key delays.
async fn type_human(element: &Element, value: &str) -> Result<(), chromiumoxide::error::CdpError> {
    for ch in value.chars() {
        element.type_str(ch.to_string()).await?;
        let delay_ms = rand::rng().random_range(40..140);
        sleep(Duration::from_millis(delay_ms)).await;
    }
    Ok(())
}

/// Randomized pause between interactions.
async fn human_pause(min_ms: u64, max_ms: u64) {
    let delay_ms = rand::rng().random_range(min_ms..=max_ms);
    sleep(Duration::from_millis(delay_ms)).await;
}

/// The configured settle delay applies only after a form submission; the
/// initial page load settles on navigation (and `wait_for`) alone.
fn settle_delay(spec: &ScrapeSpec, after_submit: bool) -> Option<Duration> {
    if after_submit {
        spec.post_submit_delay_ms.map(Duration::from_millis)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sosreg_core::jurisdiction::{FormField, SearchResultSelectors};
    use sosreg_core::SelectorStrategy;

    fn spec_with_settle_delay() -> ScrapeSpec {
        ScrapeSpec {
            search_url: "https://registry.example.gov/search".to_owned(),
            officer_search_url: None,
            agent_search_url: None,
            address_search_url: None,
            detail_url_template: None,
            results: SearchResultSelectors {
                container: "table tbody".to_owned(),
                row: "tr".to_owned(),
                name: SelectorStrategy::css("td:nth-child(1)"),
                entity_number: None,
                status: None,
                entity_type: None,
                formation_date: None,
                detail_link: None,
                total_results: None,
                next_page: None,
            },
            detail: None,
            form_fields: vec![FormField::query("input#q")],
            requires_js: true,
            wait_for: None,
            post_submit_delay_ms: Some(2000),
            submit: SubmitMethod::PressEnter,
            submit_locator: None,
            captcha: None,
        }
    }

    #[test]
    fn settle_delay_applies_only_after_submit() {
        let spec = spec_with_settle_delay();
        assert_eq!(settle_delay(&spec, false), None);
        assert_eq!(settle_delay(&spec, true), Some(Duration::from_millis(2000)));
    }

    #[test]
    fn settle_delay_is_absent_when_unconfigured() {
        let mut spec = spec_with_settle_delay();
        spec.post_submit_delay_ms = None;
        assert_eq!(settle_delay(&spec, true), None);
    }
}
