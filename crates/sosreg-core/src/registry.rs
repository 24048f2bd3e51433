//! Registry configuration store.
//!
//! Loaded once at process start from the hand-authored table in
//! [`crate::jurisdictions`]; read-only afterwards, so lookups need no
//! synchronization.

use std::collections::HashMap;

use crate::jurisdiction::{JurisdictionConfig, ScrapeSpec, Tier};
use crate::ConfigError;

/// Immutable store of per-jurisdiction configs, indexed by code.
#[derive(Debug)]
pub struct JurisdictionRegistry {
    configs: Vec<JurisdictionConfig>,
    by_code: HashMap<String, usize>,
}

impl JurisdictionRegistry {
    /// Builds a registry from explicit configs, validating each entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidJurisdiction`] for the first config
    /// with validation violations. Configs are static data, so a violation
    /// is a programming error surfaced at startup, not a runtime condition.
    pub fn new(configs: Vec<JurisdictionConfig>) -> Result<Self, ConfigError> {
        for config in &configs {
            let violations = Self::validate(config);
            if !violations.is_empty() {
                return Err(ConfigError::InvalidJurisdiction {
                    code: config.code.clone(),
                    violations,
                });
            }
        }
        let by_code = configs
            .iter()
            .enumerate()
            .map(|(i, c)| (c.code.clone(), i))
            .collect();
        Ok(Self { configs, by_code })
    }

    /// The built-in jurisdiction table shipped with the system.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidJurisdiction`] if the built-in table
    /// fails validation (covered by tests; should never happen in a
    /// release).
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::new(crate::jurisdictions::all())
    }

    /// Looks up a jurisdiction by its lowercase code.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownJurisdiction`] when no config exists
    /// for `code`.
    pub fn get(&self, code: &str) -> Result<&JurisdictionConfig, ConfigError> {
        let normalized = code.trim().to_lowercase();
        self.by_code
            .get(&normalized)
            .map(|&i| &self.configs[i])
            .ok_or(ConfigError::UnknownJurisdiction(normalized))
    }

    #[must_use]
    pub fn all(&self) -> &[JurisdictionConfig] {
        &self.configs
    }

    /// Returns every invariant `config` violates, empty when valid.
    ///
    /// Checks tier/spec consistency, CSS selector and regex syntax, detail
    /// template placeholders, and tier-4 challenge config. Run at load
    /// time only, never on the query path.
    #[must_use]
    pub fn validate(config: &JurisdictionConfig) -> Vec<String> {
        let mut violations = Vec::new();

        if config.code.is_empty() || config.code != config.code.to_lowercase() {
            violations.push(format!("code \"{}\" must be non-empty lowercase", config.code));
        }

        match config.tier {
            Tier::OpenApi => {
                if config.api.is_none() {
                    violations.push("tier 1 requires an ApiSpec".to_owned());
                }
            }
            Tier::StaticHtml | Tier::ScriptRendered | Tier::CaptchaProtected => {
                if config.scrape.is_none() {
                    violations.push(format!(
                        "tier {} requires a ScrapeSpec",
                        config.tier.as_number()
                    ));
                }
            }
        }

        if config.tier == Tier::CaptchaProtected
            && config.scrape.as_ref().is_some_and(|s| s.captcha.is_none())
        {
            violations.push("tier 4 requires a CaptchaSpec".to_owned());
        }

        if let Some(scrape) = &config.scrape {
            Self::validate_scrape(scrape, &mut violations);
        }

        violations
    }

    fn validate_scrape(scrape: &ScrapeSpec, violations: &mut Vec<String>) {
        if let Some(template) = &scrape.detail_url_template {
            if !template.contains("{id}") {
                violations.push(format!(
                    "detail_url_template \"{template}\" is missing the {{id}} placeholder"
                ));
            }
        }

        if scrape.submit == crate::jurisdiction::SubmitMethod::Click
            && scrape.submit_locator.is_none()
        {
            violations.push("submit method Click requires a submit_locator".to_owned());
        }

        for locator in scrape.bare_locators() {
            if scraper::Selector::parse(locator).is_err() {
                violations.push(format!("unparseable CSS locator \"{locator}\""));
            }
        }

        for (field, strategy) in scrape.strategies() {
            for locator in strategy.locators() {
                if scraper::Selector::parse(locator).is_err() {
                    violations.push(format!(
                        "{field}: unparseable CSS locator \"{locator}\""
                    ));
                }
            }
            if let Some(pattern) = &strategy.pattern {
                if regex::Regex::new(pattern).is_err() {
                    violations.push(format!("{field}: uncompilable pattern \"{pattern}\""));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
