//! Shared results/detail extraction, used by both the HTTP engine and the
//! browser engine (which feeds it a rendered-DOM snapshot).

use scraper::{ElementRef, Html, Selector};

use sosreg_core::entity::DetailRecord;
use sosreg_core::{Filing, Officer, ScrapeSpec, ScrapedEntity, SubListSelectors};

use crate::report::RowRecord;
use crate::selector::resolve;

/// Parsed search page: kept rows, total-found count, absolutized next-page
/// URL when the registry paginates.
pub(crate) struct ParsedResults {
    pub rows: Vec<RowRecord>,
    pub total_found: u32,
    pub next_page_url: Option<String>,
    /// Row elements found inside the container, named or not.
    rows_seen: usize,
    /// Rows whose name strategy resolved, including those past the limit.
    named_rows: u32,
}

impl ParsedResults {
    /// Row elements were present but the name strategy resolved on none of
    /// them: the page structure no longer matches the configured selectors,
    /// which is a parse failure rather than an empty result.
    pub(crate) fn selectors_missed(&self) -> bool {
        self.rows_seen > 0 && self.named_rows == 0
    }
}

/// Extracts result rows from a search page.
///
/// A row without a resolvable entity name is silently dropped — it is not a
/// valid record. A missing results container yields zero rows rather than
/// an error; registries commonly render a bare "no results" page.
pub(crate) fn parse_search_results(
    html: &str,
    spec: &ScrapeSpec,
    code: &str,
    page_url: &str,
    limit: usize,
) -> ParsedResults {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let selectors = &spec.results;

    let Ok(container_selector) = Selector::parse(&selectors.container) else {
        tracing::warn!(code, container = %selectors.container, "unparseable container locator");
        return empty_results();
    };
    let Some(container) = root.select(&container_selector).next() else {
        tracing::debug!(code, page_url, "no results container on page");
        return empty_results();
    };
    let Ok(row_selector) = Selector::parse(&selectors.row) else {
        tracing::warn!(code, row = %selectors.row, "unparseable row locator");
        return empty_results();
    };

    let mut rows = Vec::new();
    let mut rows_seen = 0usize;
    let mut matched = 0u32;
    for row in container.select(&row_selector) {
        rows_seen += 1;
        let Some(name) = resolve(row, &selectors.name) else {
            tracing::debug!(code, "dropping row without a resolvable entity name");
            continue;
        };
        matched += 1;
        if rows.len() >= limit {
            // Keep counting matches past the limit so total_found stays
            // honest when the page has no explicit counter.
            continue;
        }

        let mut entity = ScrapedEntity::new(name, code, page_url.to_owned());
        entity.entity_number = selectors
            .entity_number
            .as_ref()
            .and_then(|s| resolve(row, s));
        entity.status = selectors.status.as_ref().and_then(|s| resolve(row, s));
        entity.entity_type = selectors.entity_type.as_ref().and_then(|s| resolve(row, s));
        entity.formation_date = selectors
            .formation_date
            .as_ref()
            .and_then(|s| resolve(row, s));

        let detail_url = selectors
            .detail_link
            .as_ref()
            .and_then(|s| resolve(row, s))
            .and_then(|href| absolutize(page_url, &href))
            .or_else(|| {
                entity
                    .entity_number
                    .as_deref()
                    .and_then(|number| detail_from_template(spec, number))
            });

        rows.push(RowRecord { entity, detail_url });
    }

    let total_found = selectors
        .total_results
        .as_ref()
        .and_then(|s| resolve(root, s))
        .and_then(|text| parse_count(&text))
        .unwrap_or(matched);

    let next_page_url = selectors
        .next_page
        .as_ref()
        .and_then(|s| resolve(root, s))
        .and_then(|href| absolutize(page_url, &href));

    ParsedResults {
        rows,
        total_found,
        next_page_url,
        rows_seen,
        named_rows: matched,
    }
}

/// Extracts an entity detail page into a partial record for merging.
pub(crate) fn parse_detail_page(
    html: &str,
    spec: &ScrapeSpec,
    page_url: &str,
) -> DetailRecord {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let mut record = DetailRecord {
        source_url: page_url.to_owned(),
        ..DetailRecord::default()
    };
    let Some(detail) = &spec.detail else {
        return record;
    };

    record.entity_number = detail.entity_number.as_ref().and_then(|s| resolve(root, s));
    record.status = detail.status.as_ref().and_then(|s| resolve(root, s));
    record.formation_date = detail
        .formation_date
        .as_ref()
        .and_then(|s| resolve(root, s));
    record.entity_type = detail.entity_type.as_ref().and_then(|s| resolve(root, s));
    record.registered_address = detail
        .registered_address
        .as_ref()
        .and_then(|s| resolve(root, s));
    record.registered_agent = detail
        .registered_agent
        .as_ref()
        .and_then(|s| resolve(root, s));

    if let Some(officers) = &detail.officers {
        record.officers = sub_rows(root, officers)
            .into_iter()
            .filter_map(|(first, second, third)| {
                // Column contract for officer lists: first = name,
                // second = title, third = address.
                let name = first?;
                Some(Officer {
                    name,
                    title: second.unwrap_or_else(|| "Unknown".to_owned()),
                    address: third,
                    start_date: None,
                })
            })
            .collect();
    }

    if let Some(filings) = &detail.filings {
        record.filings = sub_rows(root, filings)
            .into_iter()
            .filter_map(|(first, second, third)| {
                let kind = first?;
                Some(Filing {
                    kind,
                    date: second,
                    description: third,
                })
            })
            .collect();
    }

    record
}

/// Iterates a detail-page sub-list (officers, filings) the same way search
/// extraction iterates a results container.
fn sub_rows(
    root: ElementRef<'_>,
    sub: &SubListSelectors,
) -> Vec<(Option<String>, Option<String>, Option<String>)> {
    let Ok(container_selector) = Selector::parse(&sub.container) else {
        return Vec::new();
    };
    let Some(container) = root.select(&container_selector).next() else {
        return Vec::new();
    };
    let Ok(row_selector) = Selector::parse(&sub.row) else {
        return Vec::new();
    };

    container
        .select(&row_selector)
        .map(|row| {
            (
                resolve(row, &sub.first),
                sub.second.as_ref().and_then(|s| resolve(row, s)),
                sub.third.as_ref().and_then(|s| resolve(row, s)),
            )
        })
        .collect()
}

fn empty_results() -> ParsedResults {
    ParsedResults {
        rows: Vec::new(),
        total_found: 0,
        next_page_url: None,
        rows_seen: 0,
        named_rows: 0,
    }
}

fn detail_from_template(spec: &ScrapeSpec, entity_number: &str) -> Option<String> {
    spec.detail_url_template
        .as_ref()
        .map(|template| template.replace("{id}", entity_number))
}

/// Resolves a possibly-relative href against the page it appeared on.
fn absolutize(page_url: &str, href: &str) -> Option<String> {
    url::Url::parse(page_url)
        .and_then(|base| base.join(href))
        .map(String::from)
        .ok()
}

/// Pulls a count out of "312", "1,204", or "of 312 results" style text.
fn parse_count(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
