use super::*;
use sosreg_core::jurisdiction::{
    DetailPageSelectors, FormField, SearchResultSelectors, SubmitMethod,
};
use sosreg_core::{SelectorStrategy, ValueTransform};

fn fixture_spec() -> ScrapeSpec {
    ScrapeSpec {
        search_url: "https://registry.example.gov/search".to_owned(),
        officer_search_url: None,
        agent_search_url: None,
        address_search_url: None,
        detail_url_template: None,
        results: SearchResultSelectors {
            container: "table#results tbody".to_owned(),
            row: "tr".to_owned(),
            name: SelectorStrategy::css("td.name a")
                .fallback("td:nth-child(1)")
                .transform(ValueTransform::CollapseWhitespace),
            entity_number: Some(SelectorStrategy::css("td.number")),
            status: Some(
                SelectorStrategy::css("td.status").transform(ValueTransform::NormalizeStatus),
            ),
            entity_type: None,
            formation_date: None,
            detail_link: Some(SelectorStrategy::css("td.name a").attr("href")),
            total_results: Some(SelectorStrategy::css("p.count").pattern(r"of\s+([\d,]+)")),
            next_page: Some(SelectorStrategy::css("a.next").attr("href")),
        },
        detail: None,
        form_fields: vec![FormField::query("input#q")],
        requires_js: false,
        wait_for: None,
        post_submit_delay_ms: None,
        submit: SubmitMethod::FormSubmit,
        submit_locator: None,
        captcha: None,
    }
}

const SEARCH_PAGE: &str = r#"
<html><body>
  <p class="count">Showing 1-3 of 3 results</p>
  <table id="results"><tbody>
    <tr>
      <td class="name"><a href="/detail/100">ACME LLC</a></td>
      <td class="number">L100</td>
      <td class="status">ACTIVE</td>
    </tr>
    <tr>
      <td class="name"><a href="/detail/101">ACME HOLDINGS LLC</a></td>
      <td class="number">L101</td>
      <td class="status">INACT</td>
    </tr>
    <tr>
      <td class="name"></td>
      <td class="number">L999</td>
      <td class="status">ACTIVE</td>
    </tr>
    <tr>
      <td class="name"><a href="https://other.example.gov/detail/102">ACME SERVICES LLC</a></td>
      <td class="number">L102</td>
      <td class="status">ACTIVE</td>
    </tr>
  </tbody></table>
  <a class="next" href="?page=2">Next</a>
</body></html>
"#;

#[test]
fn extracts_rows_and_drops_nameless_ones() {
    let parsed = parse_search_results(
        SEARCH_PAGE,
        &fixture_spec(),
        "fl",
        "https://registry.example.gov/search?q=acme",
        25,
    );
    assert_eq!(parsed.rows.len(), 3, "row without a name must be dropped");
    let names: Vec<_> = parsed.rows.iter().map(|r| r.entity.name.as_str()).collect();
    assert_eq!(names, vec!["ACME LLC", "ACME HOLDINGS LLC", "ACME SERVICES LLC"]);
}

#[test]
fn normalizes_status_per_strategy() {
    let parsed = parse_search_results(
        SEARCH_PAGE,
        &fixture_spec(),
        "fl",
        "https://registry.example.gov/search",
        25,
    );
    assert_eq!(parsed.rows[0].entity.status.as_deref(), Some("Active"));
    assert_eq!(parsed.rows[1].entity.status.as_deref(), Some("Inactive"));
}

#[test]
fn detail_links_are_absolutized() {
    let parsed = parse_search_results(
        SEARCH_PAGE,
        &fixture_spec(),
        "fl",
        "https://registry.example.gov/search?q=acme",
        25,
    );
    assert_eq!(
        parsed.rows[0].detail_url.as_deref(),
        Some("https://registry.example.gov/detail/100")
    );
    // Absolute hrefs pass through untouched.
    assert_eq!(
        parsed.rows[2].detail_url.as_deref(),
        Some("https://other.example.gov/detail/102")
    );
}

#[test]
fn total_found_comes_from_the_counter() {
    let parsed = parse_search_results(
        SEARCH_PAGE,
        &fixture_spec(),
        "fl",
        "https://registry.example.gov/search",
        25,
    );
    assert_eq!(parsed.total_found, 3);
}

#[test]
fn total_found_falls_back_to_matched_rows_past_the_limit() {
    let mut spec = fixture_spec();
    spec.results.total_results = None;
    let parsed = parse_search_results(
        SEARCH_PAGE,
        &spec,
        "fl",
        "https://registry.example.gov/search",
        1,
    );
    assert_eq!(parsed.rows.len(), 1, "limit respected");
    assert_eq!(parsed.total_found, 3, "count keeps running past the limit");
}

#[test]
fn next_page_is_resolved_against_the_page_url() {
    let parsed = parse_search_results(
        SEARCH_PAGE,
        &fixture_spec(),
        "fl",
        "https://registry.example.gov/search",
        25,
    );
    assert_eq!(
        parsed.next_page_url.as_deref(),
        Some("https://registry.example.gov/search?page=2")
    );
}

#[test]
fn all_nameless_rows_flag_a_selector_miss() {
    let rotted = r#"
    <html><body>
      <table id="results"><tbody>
        <tr><td></td><td class="renamed">ACME LLC</td></tr>
        <tr><td></td><td class="renamed">ACME HOLDINGS LLC</td></tr>
      </tbody></table>
    </body></html>
    "#;
    let parsed = parse_search_results(
        rotted,
        &fixture_spec(),
        "fl",
        "https://registry.example.gov/search",
        25,
    );
    assert!(parsed.rows.is_empty());
    assert!(parsed.selectors_missed(), "rows present, no name resolvable");
}

#[test]
fn mixed_rows_are_not_a_selector_miss() {
    let parsed = parse_search_results(
        SEARCH_PAGE,
        &fixture_spec(),
        "fl",
        "https://registry.example.gov/search",
        25,
    );
    assert!(!parsed.selectors_missed());
}

#[test]
fn missing_container_yields_zero_rows_not_an_error() {
    let parsed = parse_search_results(
        "<html><body><p>No records found.</p></body></html>",
        &fixture_spec(),
        "fl",
        "https://registry.example.gov/search",
        25,
    );
    assert!(parsed.rows.is_empty());
    assert_eq!(parsed.total_found, 0);
    assert!(!parsed.selectors_missed(), "no rows at all is an empty result");
}

#[test]
fn entity_number_feeds_the_detail_template_when_no_link() {
    let mut spec = fixture_spec();
    spec.results.detail_link = None;
    spec.detail_url_template =
        Some("https://registry.example.gov/entity/{id}".to_owned());
    let parsed = parse_search_results(
        SEARCH_PAGE,
        &spec,
        "fl",
        "https://registry.example.gov/search",
        25,
    );
    assert_eq!(
        parsed.rows[0].detail_url.as_deref(),
        Some("https://registry.example.gov/entity/L100")
    );
}

const DETAIL_PAGE: &str = r#"
<html><body>
  <div class="entity">
    <span class="number">L100</span>
    <span class="status">ACTIVE</span>
    <span class="agent">REGISTERED AGENTS INC</span>
  </div>
  <div class="officers">
    <div class="officer"><span class="title">MGR</span><span class="name">DOE, JANE</span></div>
    <div class="officer"><span class="title">MGRM</span><span class="name">ROE, RICHARD</span></div>
    <div class="officer"><span class="title">AMBR</span><span class="name"></span></div>
  </div>
  <table class="filings"><tbody>
    <tr><td>Annual Report</td><td>04/12/2023</td><td>Filed online</td></tr>
    <tr><td>Amendment</td><td>09/01/2021</td><td></td></tr>
  </tbody></table>
</body></html>
"#;

fn detail_spec() -> ScrapeSpec {
    let mut spec = fixture_spec();
    spec.detail = Some(DetailPageSelectors {
        entity_number: Some(SelectorStrategy::css("span.number")),
        status: Some(
            SelectorStrategy::css("span.status").transform(ValueTransform::NormalizeStatus),
        ),
        formation_date: None,
        entity_type: None,
        registered_address: None,
        registered_agent: Some(
            SelectorStrategy::css("span.agent").transform(ValueTransform::TitleCase),
        ),
        officers: Some(sosreg_core::SubListSelectors {
            container: "div.officers".to_owned(),
            row: "div.officer".to_owned(),
            first: SelectorStrategy::css("span.name").transform(ValueTransform::CollapseWhitespace),
            second: Some(SelectorStrategy::css("span.title")),
            third: None,
        }),
        filings: Some(sosreg_core::SubListSelectors {
            container: "table.filings tbody".to_owned(),
            row: "tr".to_owned(),
            first: SelectorStrategy::css("td:nth-child(1)"),
            second: Some(SelectorStrategy::css("td:nth-child(2)")),
            third: Some(SelectorStrategy::css("td:nth-child(3)")),
        }),
    });
    spec
}

#[test]
fn detail_page_extracts_entity_fields() {
    let record = parse_detail_page(
        DETAIL_PAGE,
        &detail_spec(),
        "https://registry.example.gov/detail/100",
    );
    assert_eq!(record.entity_number.as_deref(), Some("L100"));
    assert_eq!(record.status.as_deref(), Some("Active"));
    assert_eq!(record.registered_agent.as_deref(), Some("Registered Agents Inc"));
}

#[test]
fn officer_rows_without_names_are_dropped() {
    let record = parse_detail_page(
        DETAIL_PAGE,
        &detail_spec(),
        "https://registry.example.gov/detail/100",
    );
    assert_eq!(record.officers.len(), 2);
    assert_eq!(record.officers[0].name, "DOE, JANE");
    assert_eq!(record.officers[0].title, "MGR");
}

#[test]
fn filing_rows_keep_optional_columns() {
    let record = parse_detail_page(
        DETAIL_PAGE,
        &detail_spec(),
        "https://registry.example.gov/detail/100",
    );
    assert_eq!(record.filings.len(), 2);
    assert_eq!(record.filings[0].kind, "Annual Report");
    assert_eq!(record.filings[0].date.as_deref(), Some("04/12/2023"));
    assert_eq!(record.filings[1].description, None);
}

#[test]
fn detail_without_selectors_is_an_empty_record() {
    let record = parse_detail_page(
        DETAIL_PAGE,
        &fixture_spec(),
        "https://registry.example.gov/detail/100",
    );
    assert_eq!(record.entity_number, None);
    assert!(record.officers.is_empty());
}
