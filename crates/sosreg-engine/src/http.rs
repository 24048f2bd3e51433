//! Tier-2 execution: static-HTML scraping over plain HTTP.

use std::time::Duration;

use reqwest::Client;

use sosreg_core::entity::DetailRecord;
use sosreg_core::{JurisdictionConfig, ScrapeSpec};

use crate::error::ScrapeError;
use crate::extract::{parse_detail_page, parse_search_results};
use crate::report::{SearchOptions, SearchOutcome};

/// Pagination guard: plenty for name searches, and a hard stop against
/// cycling next-page links.
const MAX_PAGES: usize = 5;

pub struct HttpEngine {
    client: Client,
}

impl HttpEngine {
    /// # Errors
    ///
    /// Returns [`ScrapeError::Transport`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches and parses the search page (following next-page links while
    /// under the requested limit).
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::Transport`] — network failure or timeout.
    /// - [`ScrapeError::UnexpectedStatus`] — non-2xx response.
    /// - [`ScrapeError::Parse`] — the first page has result rows but the
    ///   name strategy resolved on none of them (selector rot).
    pub async fn search(
        &self,
        config: &JurisdictionConfig,
        spec: &ScrapeSpec,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchOutcome, ScrapeError> {
        let params: Vec<(String, String)> = spec
            .form_fields
            .iter()
            .map(|field| (form_param_name(&field.locator), field.resolved_value(query)))
            .collect();

        let mut page_url = spec.search_url.clone();
        let mut first_page = true;
        let mut rows = Vec::new();
        let mut total_found = 0u32;

        for page_index in 0..MAX_PAGES {
            let mut request = self.client.get(&page_url);
            if first_page {
                request = request.query(&params);
            }
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ScrapeError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: page_url,
                });
            }
            let fetched_url = response.url().to_string();
            let html = response.text().await?;

            let remaining = options.limit.saturating_sub(rows.len());
            let parsed = parse_search_results(&html, spec, &config.code, &fetched_url, remaining);
            if first_page {
                if parsed.selectors_missed() {
                    return Err(ScrapeError::Parse { url: fetched_url });
                }
                total_found = parsed.total_found;
            }
            rows.extend(parsed.rows);

            tracing::debug!(
                code = %config.code,
                page = page_index + 1,
                collected = rows.len(),
                total_found,
                "parsed search page"
            );

            match parsed.next_page_url {
                Some(next) if rows.len() < options.limit => {
                    page_url = next;
                    first_page = false;
                }
                _ => break,
            }
        }

        Ok(SearchOutcome { rows, total_found })
    }

    /// Fetches one detail page and extracts a partial record.
    ///
    /// # Errors
    ///
    /// Same failure surface as [`Self::search`].
    pub async fn fetch_detail(
        &self,
        config: &JurisdictionConfig,
        spec: &ScrapeSpec,
        url: &str,
    ) -> Result<DetailRecord, ScrapeError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        let html = response.text().await?;
        tracing::debug!(code = %config.code, url, "parsed detail page");
        Ok(parse_detail_page(&html, spec, url))
    }
}

/// Derives the HTTP parameter name from a form-field locator.
///
/// Tier-2 registries accept their search form's input names as plain query
/// parameters, so one config shape serves both the HTTP engine (parameter
/// name) and the browser engine (CSS locator): `input[name="searchValue"]`
/// yields `searchValue`, `input#SearchTerm` yields `SearchTerm`.
fn form_param_name(locator: &str) -> String {
    if let Some(start) = locator.find("[name=") {
        let rest = &locator[start + "[name=".len()..];
        let trimmed = rest
            .trim_start_matches(['"', '\''])
            .split(['"', '\'', ']'])
            .next()
            .unwrap_or_default();
        if !trimmed.is_empty() {
            return trimmed.to_owned();
        }
    }
    if let Some(hash) = locator.rfind('#') {
        let id: String = locator[hash + 1..]
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        if !id.is_empty() {
            return id;
        }
    }
    locator.to_owned()
}
