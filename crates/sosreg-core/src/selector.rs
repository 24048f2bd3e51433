//! Declarative, fallback-capable field locators.
//!
//! A [`SelectorStrategy`] describes *where* one field lives in a document and
//! how to clean its value up, without saying anything about how the document
//! was obtained. The same strategy is evaluated against statically fetched
//! HTML and against a rendered browser snapshot, which is what lets a
//! jurisdiction move between tiers with a config-only change.
//!
//! Resolution order is a fixed contract: locate (primary, then fallbacks in
//! declared order) → attribute read → regex extraction → transform. Later
//! stages assume the previous stage's output shape, so the order never
//! varies per field.

use serde::{Deserialize, Serialize};

/// A pure, enumerated value cleanup applied as the last resolution stage.
///
/// Enumerated rather than a function pointer so strategies stay plain data:
/// printable, comparable, and serializable alongside the rest of a
/// jurisdiction's config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueTransform {
    /// Strip leading/trailing whitespace.
    Trim,
    /// Collapse internal whitespace runs to single spaces, then trim.
    CollapseWhitespace,
    /// Title-case each word (registries love SHOUTING entity names).
    TitleCase,
    /// Map the registry's status vocabulary onto `Active`/`Inactive`/as-is.
    NormalizeStatus,
    /// Rewrite common registry date formats as ISO `YYYY-MM-DD`; unknown
    /// formats ("Perpetual", fiscal-year text) pass through trimmed.
    NormalizeDate,
}

impl ValueTransform {
    #[must_use]
    pub fn apply(self, value: &str) -> String {
        match self {
            Self::Trim => value.trim().to_owned(),
            Self::CollapseWhitespace => value.split_whitespace().collect::<Vec<_>>().join(" "),
            Self::TitleCase => value
                .split_whitespace()
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => {
                            first.to_uppercase().collect::<String>()
                                + &chars.as_str().to_lowercase()
                        }
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
            Self::NormalizeStatus => {
                let lowered = value.trim().to_lowercase();
                if lowered.starts_with("act") || lowered == "good standing" || lowered == "ok" {
                    "Active".to_owned()
                } else if lowered.starts_with("inact")
                    || lowered.starts_with("dissolv")
                    || lowered.starts_with("revoke")
                    || lowered.starts_with("forfeit")
                {
                    "Inactive".to_owned()
                } else {
                    value.trim().to_owned()
                }
            }
            Self::NormalizeDate => {
                let trimmed = value.trim();
                for format in ["%m/%d/%Y", "%m-%d-%Y", "%Y-%m-%d", "%B %d, %Y"] {
                    if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, format) {
                        return date.format("%Y-%m-%d").to_string();
                    }
                }
                trimmed.to_owned()
            }
        }
    }
}

/// Where to find one field's value in a document, with fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorStrategy {
    /// Primary CSS locator, tried first.
    pub primary: String,
    /// Fallback CSS locators, tried in declared order when the primary
    /// yields no match or an empty value.
    #[serde(default)]
    pub fallbacks: Vec<String>,
    /// Read this attribute instead of the element's text content.
    #[serde(default)]
    pub attribute: Option<String>,
    /// Regex applied to the located value; the first capture group wins,
    /// or the whole match when the pattern has no groups.
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub transform: Option<ValueTransform>,
}

impl SelectorStrategy {
    /// A strategy with just a primary CSS locator.
    #[must_use]
    pub fn css(primary: &str) -> Self {
        Self {
            primary: primary.to_owned(),
            fallbacks: Vec::new(),
            attribute: None,
            pattern: None,
            transform: None,
        }
    }

    #[must_use]
    pub fn fallback(mut self, locator: &str) -> Self {
        self.fallbacks.push(locator.to_owned());
        self
    }

    #[must_use]
    pub fn attr(mut self, name: &str) -> Self {
        self.attribute = Some(name.to_owned());
        self
    }

    #[must_use]
    pub fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_owned());
        self
    }

    #[must_use]
    pub fn transform(mut self, transform: ValueTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// All locators in resolution order: primary first, then fallbacks.
    pub fn locators(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.fallbacks.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_fixes_shouting() {
        assert_eq!(ValueTransform::TitleCase.apply("ACME HOLDINGS LLC"), "Acme Holdings Llc");
    }

    #[test]
    fn collapse_whitespace_squashes_runs() {
        assert_eq!(
            ValueTransform::CollapseWhitespace.apply("  123 Main   St\n  Suite 4 "),
            "123 Main St Suite 4"
        );
    }

    #[test]
    fn normalize_status_maps_variants() {
        assert_eq!(ValueTransform::NormalizeStatus.apply("ACTIVE"), "Active");
        assert_eq!(ValueTransform::NormalizeStatus.apply("Act/Owner"), "Active");
        assert_eq!(ValueTransform::NormalizeStatus.apply("INACT"), "Inactive");
        assert_eq!(ValueTransform::NormalizeStatus.apply("Dissolved"), "Inactive");
        // Unknown vocabulary passes through trimmed.
        assert_eq!(ValueTransform::NormalizeStatus.apply(" Merged "), "Merged");
    }

    #[test]
    fn normalize_date_rewrites_common_formats_as_iso() {
        assert_eq!(ValueTransform::NormalizeDate.apply("04/12/2023"), "2023-04-12");
        assert_eq!(ValueTransform::NormalizeDate.apply("4/2/2023"), "2023-04-02");
        assert_eq!(ValueTransform::NormalizeDate.apply("April 12, 2023"), "2023-04-12");
        assert_eq!(ValueTransform::NormalizeDate.apply("2023-04-12"), "2023-04-12");
    }

    #[test]
    fn normalize_date_passes_unrecognized_text_through() {
        assert_eq!(ValueTransform::NormalizeDate.apply(" Perpetual "), "Perpetual");
    }

    #[test]
    fn locators_yields_primary_then_fallbacks() {
        let strategy = SelectorStrategy::css("td.name a")
            .fallback("td:nth-child(1)")
            .fallback(".entity-name");
        let locators: Vec<_> = strategy.locators().collect();
        assert_eq!(locators, vec!["td.name a", "td:nth-child(1)", ".entity-name"]);
    }
}
