//! Selector strategy resolution against parsed documents.
//!
//! One generic resolver evaluates every [`SelectorStrategy`] the same way,
//! whatever jurisdiction or document it came from: try the primary locator,
//! then each fallback in declared order, stop at the first non-empty match;
//! then attribute read, regex extraction, and transform, in that fixed
//! order. Absence is `None`, never an error — government HTML omits fields
//! inconsistently, and only the caller knows whether a missing field voids
//! the record.

use scraper::ElementRef;

use sosreg_core::SelectorStrategy;

/// Resolves `strategy` within `scope` (an element or a document root).
#[must_use]
pub fn resolve(scope: ElementRef<'_>, strategy: &SelectorStrategy) -> Option<String> {
    let located = locate(scope, strategy)?;
    let narrowed = match &strategy.pattern {
        Some(pattern) => apply_pattern(pattern, &located)?,
        None => located,
    };
    let value = match strategy.transform {
        Some(transform) => transform.apply(&narrowed),
        None => narrowed,
    };
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// First locator (primary, then fallbacks) yielding a non-empty value.
fn locate(scope: ElementRef<'_>, strategy: &SelectorStrategy) -> Option<String> {
    for locator in strategy.locators() {
        let Ok(selector) = scraper::Selector::parse(locator) else {
            // Caught by registry validation at load time; tolerate here so
            // one bad locator cannot take down the whole extraction.
            tracing::debug!(locator, "skipping unparseable locator");
            continue;
        };
        for element in scope.select(&selector) {
            let raw = match &strategy.attribute {
                Some(attr) => element.value().attr(attr).unwrap_or_default().to_owned(),
                None => element.text().collect::<String>(),
            };
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_owned());
            }
        }
    }
    None
}

/// First capture group when the pattern has one, else the whole match.
fn apply_pattern(pattern: &str, value: &str) -> Option<String> {
    let Ok(re) = regex::Regex::new(pattern) else {
        tracing::debug!(pattern, "skipping uncompilable pattern");
        return Some(value.to_owned());
    };
    let captures = re.captures(value)?;
    let matched = captures.get(1).or_else(|| captures.get(0))?;
    Some(matched.as_str().trim().to_owned())
}
