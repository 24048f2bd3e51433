//! Per-jurisdiction configuration types.
//!
//! One [`JurisdictionConfig`] fully describes how to query a single
//! government business registry: which access tier it sits in, where its
//! search endpoint lives, and how to pull fields out of whatever it returns.
//! Configs are hand-authored build-time data (see [`crate::jurisdictions`]),
//! loaded once at process start and never mutated.

use serde::{Deserialize, Serialize};

use crate::selector::SelectorStrategy;

/// Accessibility classification of a jurisdiction's data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    /// Tier 1: open-data / REST API, no scraping needed.
    OpenApi,
    /// Tier 2: server-rendered HTML, plain HTTP fetch + parse.
    StaticHtml,
    /// Tier 3: JavaScript-rendered search UI, needs a browser session.
    ScriptRendered,
    /// Tier 4: browser session plus CAPTCHA challenge handling.
    CaptchaProtected,
}

impl Tier {
    #[must_use]
    pub fn as_number(self) -> u8 {
        match self {
            Self::OpenApi => 1,
            Self::StaticHtml => 2,
            Self::ScriptRendered => 3,
            Self::CaptchaProtected => 4,
        }
    }

    /// Whether this tier is executed through the headless browser engine.
    #[must_use]
    pub fn needs_browser(self) -> bool {
        matches!(self, Self::ScriptRendered | Self::CaptchaProtected)
    }
}

/// Target attribute of a [`FieldMapping`] for tier-1 API rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityField {
    EntityNumber,
    Status,
    FormationDate,
    EntityType,
    RegisteredAgent,
    RegisteredAddress,
}

/// Declarative column-to-attribute mapping for one API response field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Source field name in the API row.
    pub source: String,
    pub target: EntityField,
}

/// How to query a tier-1 open-data endpoint (Socrata-style SoQL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSpec {
    /// Full query endpoint URL, e.g. a `*.json` Socrata resource.
    pub endpoint: String,
    /// Row field holding the entity name (used for the contains filter).
    pub name_field: String,
    /// Row field holding the entity status, when the dataset has one.
    #[serde(default)]
    pub status_field: Option<String>,
    /// Row field to order results by (usually the name field).
    #[serde(default)]
    pub order_field: Option<String>,
    #[serde(default)]
    pub mappings: Vec<FieldMapping>,
    /// Source fields concatenated (comma-joined) into the registered
    /// address when the dataset splits it across columns.
    #[serde(default)]
    pub address_parts: Vec<String>,
}

/// How the browser engine submits a filled search form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitMethod {
    /// Click a submit button located by `ScrapeSpec::submit_locator`.
    Click,
    /// Press Enter inside the last filled form field.
    PressEnter,
    /// Call `form.submit()` on the surrounding form element.
    FormSubmit,
}

/// One search-form field to populate before submitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    /// CSS locator of the input element.
    pub locator: String,
    /// `{query}` is replaced with the search term; any other value is
    /// written literally (hidden flags, search-type radio values, ...).
    pub value: String,
}

impl FormField {
    #[must_use]
    pub fn query(locator: &str) -> Self {
        Self {
            locator: locator.to_owned(),
            value: "{query}".to_owned(),
        }
    }

    #[must_use]
    pub fn literal(locator: &str, value: &str) -> Self {
        Self {
            locator: locator.to_owned(),
            value: value.to_owned(),
        }
    }

    /// The concrete value to type for a given search term.
    #[must_use]
    pub fn resolved_value(&self, query: &str) -> String {
        self.value.replace("{query}", query)
    }
}

/// Selector bundle for a search-results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultSelectors {
    /// Container holding all result rows.
    pub container: String,
    /// One result row within the container.
    pub row: String,
    pub name: SelectorStrategy,
    #[serde(default)]
    pub entity_number: Option<SelectorStrategy>,
    #[serde(default)]
    pub status: Option<SelectorStrategy>,
    #[serde(default)]
    pub entity_type: Option<SelectorStrategy>,
    #[serde(default)]
    pub formation_date: Option<SelectorStrategy>,
    /// Link to the entity's detail page, usually an `href` read.
    #[serde(default)]
    pub detail_link: Option<SelectorStrategy>,
    /// "Showing 1-25 of 312 results" style counter.
    #[serde(default)]
    pub total_results: Option<SelectorStrategy>,
    #[serde(default)]
    pub next_page: Option<SelectorStrategy>,
}

/// Selector bundle for a sub-list on a detail page (officers, filings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubListSelectors {
    pub container: String,
    pub row: String,
    /// Per-column strategies; interpretation depends on the list kind.
    pub first: SelectorStrategy,
    #[serde(default)]
    pub second: Option<SelectorStrategy>,
    #[serde(default)]
    pub third: Option<SelectorStrategy>,
}

/// Selector bundle for an entity detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailPageSelectors {
    #[serde(default)]
    pub entity_number: Option<SelectorStrategy>,
    #[serde(default)]
    pub status: Option<SelectorStrategy>,
    #[serde(default)]
    pub formation_date: Option<SelectorStrategy>,
    #[serde(default)]
    pub entity_type: Option<SelectorStrategy>,
    #[serde(default)]
    pub registered_address: Option<SelectorStrategy>,
    #[serde(default)]
    pub registered_agent: Option<SelectorStrategy>,
    /// Officer rows: first = name, second = title, third = address.
    #[serde(default)]
    pub officers: Option<SubListSelectors>,
    /// Filing rows: first = kind, second = date, third = description.
    #[serde(default)]
    pub filings: Option<SubListSelectors>,
}

/// CAPTCHA challenge locators for tier-4 jurisdictions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptchaSpec {
    /// Element carrying the challenge image; its presence signals a
    /// challenge, and its screenshot is the artifact handed to the solver.
    pub image_locator: String,
    /// Input the solved token is typed into.
    pub input_locator: String,
    /// Separate challenge-submit control, when the challenge is not part
    /// of the main search form.
    #[serde(default)]
    pub submit_locator: Option<String>,
}

/// How to scrape a tier ≥ 2 jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeSpec {
    /// Entity-name search page.
    pub search_url: String,
    #[serde(default)]
    pub officer_search_url: Option<String>,
    #[serde(default)]
    pub agent_search_url: Option<String>,
    #[serde(default)]
    pub address_search_url: Option<String>,
    /// Detail-page URL template with an `{id}` placeholder, for registries
    /// whose detail pages are directly addressable by entity number.
    #[serde(default)]
    pub detail_url_template: Option<String>,
    pub results: SearchResultSelectors,
    #[serde(default)]
    pub detail: Option<DetailPageSelectors>,
    pub form_fields: Vec<FormField>,
    /// Whether the search UI needs script execution to render results.
    pub requires_js: bool,
    /// Locator the browser engine polls for before interacting.
    #[serde(default)]
    pub wait_for: Option<String>,
    /// Fixed settle delay after submit, in milliseconds.
    #[serde(default)]
    pub post_submit_delay_ms: Option<u64>,
    pub submit: SubmitMethod,
    /// Locator of the submit control, required for `SubmitMethod::Click`.
    #[serde(default)]
    pub submit_locator: Option<String>,
    #[serde(default)]
    pub captcha: Option<CaptchaSpec>,
}

impl ScrapeSpec {
    /// Locators configured as bare CSS strings (containers, rows, form
    /// fields, waits), for load-time syntax validation.
    #[must_use]
    pub fn bare_locators(&self) -> Vec<&str> {
        let mut locators = vec![self.results.container.as_str(), self.results.row.as_str()];
        locators.extend(self.form_fields.iter().map(|f| f.locator.as_str()));
        locators.extend(self.wait_for.as_deref());
        locators.extend(self.submit_locator.as_deref());
        if let Some(captcha) = &self.captcha {
            locators.push(captcha.image_locator.as_str());
            locators.push(captcha.input_locator.as_str());
            locators.extend(captcha.submit_locator.as_deref());
        }
        if let Some(detail) = &self.detail {
            for sub in [&detail.officers, &detail.filings].into_iter().flatten() {
                locators.push(sub.container.as_str());
                locators.push(sub.row.as_str());
            }
        }
        locators
    }

    /// Every named [`SelectorStrategy`] in the spec, for load-time
    /// validation of locator and pattern syntax.
    #[must_use]
    pub fn strategies(&self) -> Vec<(&'static str, &SelectorStrategy)> {
        let r = &self.results;
        let mut out = vec![("results.name", &r.name)];
        let optional = [
            ("results.entity_number", &r.entity_number),
            ("results.status", &r.status),
            ("results.entity_type", &r.entity_type),
            ("results.formation_date", &r.formation_date),
            ("results.detail_link", &r.detail_link),
            ("results.total_results", &r.total_results),
            ("results.next_page", &r.next_page),
        ];
        for (name, strategy) in optional {
            if let Some(strategy) = strategy {
                out.push((name, strategy));
            }
        }
        if let Some(d) = &self.detail {
            let detail_fields = [
                ("detail.entity_number", &d.entity_number),
                ("detail.status", &d.status),
                ("detail.formation_date", &d.formation_date),
                ("detail.entity_type", &d.entity_type),
                ("detail.registered_address", &d.registered_address),
                ("detail.registered_agent", &d.registered_agent),
            ];
            for (name, strategy) in detail_fields {
                if let Some(strategy) = strategy {
                    out.push((name, strategy));
                }
            }
            for (name, sub) in [("detail.officers", &d.officers), ("detail.filings", &d.filings)]
            {
                if let Some(sub) = sub {
                    out.push((name, &sub.first));
                    if let Some(s) = &sub.second {
                        out.push((name, s));
                    }
                    if let Some(s) = &sub.third {
                        out.push((name, s));
                    }
                }
            }
        }
        out
    }
}

/// Everything needed to query one jurisdiction's business registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionConfig {
    /// Lookup key, lowercase (e.g. `"fl"`).
    pub code: String,
    /// Human-readable jurisdiction name (e.g. `"Florida"`).
    pub name: String,
    /// Name of the registry itself (e.g. `"Division of Corporations"`).
    pub registry_name: String,
    pub tier: Tier,
    pub base_url: String,
    #[serde(default)]
    pub api: Option<ApiSpec>,
    #[serde(default)]
    pub scrape: Option<ScrapeSpec>,
}

impl JurisdictionConfig {
    /// Detail URL for an entity number, when the registry supports direct
    /// detail addressing.
    #[must_use]
    pub fn detail_url(&self, entity_number: &str) -> Option<String> {
        self.scrape
            .as_ref()
            .and_then(|s| s.detail_url_template.as_ref())
            .map(|template| template.replace("{id}", entity_number))
    }
}
