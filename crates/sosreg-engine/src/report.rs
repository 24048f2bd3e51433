//! Public request/response shapes for the router contract.

use serde::{Deserialize, Serialize};

use sosreg_core::ScrapedEntity;

/// Status filter applied to search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Active,
    Inactive,
    #[default]
    Any,
}

impl StatusFilter {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Any => "any",
        }
    }

    /// Whether a (possibly absent) normalized status passes the filter.
    /// Records without a status are kept; dropping them would punish
    /// registries that simply omit the column.
    #[must_use]
    pub fn admits(self, status: Option<&str>) -> bool {
        match (self, status) {
            (Self::Any, _) | (_, None) => true,
            (Self::Active, Some(s)) => s.eq_ignore_ascii_case("active"),
            (Self::Inactive, Some(s)) => !s.eq_ignore_ascii_case("active"),
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "any" | "all" => Ok(Self::Any),
            other => Err(format!("unknown status filter \"{other}\"")),
        }
    }
}

/// Caller-supplied search options.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Maximum entities to return.
    pub limit: usize,
    pub status: StatusFilter,
    /// Bypass the cache read (a fresh result is still written back).
    pub skip_cache: bool,
    /// Run the detail-enrichment pass after the search.
    pub include_details: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 25,
            status: StatusFilter::Any,
            skip_cache: false,
            include_details: false,
        }
    }
}

impl SearchOptions {
    /// Canonical options signature folded into the cache key.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        format!(
            "limit={}|status={}|details={}",
            self.limit,
            self.status.as_str(),
            self.include_details
        )
    }
}

/// Outcome of one `search_entity` call. Every path returns one of these;
/// there is no unhandled-error path in the public contract.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub success: bool,
    pub jurisdiction: String,
    pub query: String,
    pub entities: Vec<ScrapedEntity>,
    pub total_found: u32,
    pub duration_ms: u64,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One search-result row plus the detail URL discovered alongside it, kept
/// separate because the detail URL is navigation state, not entity data.
#[derive(Debug, Clone)]
pub struct RowRecord {
    pub entity: ScrapedEntity,
    pub detail_url: Option<String>,
}

/// Raw outcome of one engine execution, before filtering and enrichment.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub rows: Vec<RowRecord>,
    pub total_found: u32,
}
