//! Normalized output types for registry scrapes.
//!
//! A [`ScrapedEntity`] is created fresh for every discovered business record
//! and is never mutated afterwards. Detail-page enrichment produces a *new*
//! merged entity via [`ScrapedEntity::merged_with`], so the original search
//! row survives as a fallback when enrichment fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An officer or director listed on a registry detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Officer {
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
}

/// A filing-history row (annual report, amendment, dissolution, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filing {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One normalized business record from a registry search or detail page.
///
/// `name` is the only required field; government registries omit everything
/// else inconsistently, so every other field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedEntity {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_number: Option<String>,
    /// Jurisdiction code this record was scraped from (e.g. `"fl"`).
    pub jurisdiction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formation_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub officers: Option<Vec<Officer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filings: Option<Vec<Filing>>,
    /// URL of the page (or API endpoint) the record was extracted from.
    pub source_url: String,
    pub captured_at: DateTime<Utc>,
}

/// Partial record extracted from a detail page, merged into a search-result
/// entity by [`ScrapedEntity::merged_with`].
#[derive(Debug, Clone, Default)]
pub struct DetailRecord {
    pub entity_number: Option<String>,
    pub status: Option<String>,
    pub formation_date: Option<String>,
    pub entity_type: Option<String>,
    pub registered_address: Option<String>,
    pub registered_agent: Option<String>,
    pub officers: Vec<Officer>,
    pub filings: Vec<Filing>,
    pub source_url: String,
}

impl ScrapedEntity {
    /// Creates a minimal entity with only the required fields set.
    #[must_use]
    pub fn new(name: String, jurisdiction: &str, source_url: String) -> Self {
        Self {
            name,
            entity_number: None,
            jurisdiction: jurisdiction.to_owned(),
            status: None,
            formation_date: None,
            entity_type: None,
            registered_address: None,
            registered_agent: None,
            officers: None,
            filings: None,
            source_url,
            captured_at: Utc::now(),
        }
    }

    /// Returns a new entity combining this search row with a detail record.
    ///
    /// Detail-page values win where both sides are present; the search row's
    /// value is kept where the detail page omitted the field. `self` is left
    /// untouched so the caller can fall back to it if enrichment fails
    /// downstream.
    #[must_use]
    pub fn merged_with(&self, detail: DetailRecord) -> Self {
        Self {
            name: self.name.clone(),
            entity_number: detail.entity_number.or_else(|| self.entity_number.clone()),
            jurisdiction: self.jurisdiction.clone(),
            status: detail.status.or_else(|| self.status.clone()),
            formation_date: detail
                .formation_date
                .or_else(|| self.formation_date.clone()),
            entity_type: detail.entity_type.or_else(|| self.entity_type.clone()),
            registered_address: detail
                .registered_address
                .or_else(|| self.registered_address.clone()),
            registered_agent: detail
                .registered_agent
                .or_else(|| self.registered_agent.clone()),
            officers: if detail.officers.is_empty() {
                self.officers.clone()
            } else {
                Some(detail.officers)
            },
            filings: if detail.filings.is_empty() {
                self.filings.clone()
            } else {
                Some(detail.filings)
            },
            source_url: detail.source_url,
            captured_at: Utc::now(),
        }
    }
}
