//! End-to-end search flow against a mock registry site: routing, parsing,
//! caching, filtering, enrichment, and circuit breaking.

use std::sync::Arc;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sosreg_core::jurisdiction::{
    DetailPageSelectors, FormField, SearchResultSelectors, SubmitMethod,
};
use sosreg_core::{
    AppConfig, JurisdictionConfig, JurisdictionRegistry, ScrapeSpec, SelectorStrategy, Tier,
    ValueTransform,
};
use sosreg_engine::{RegistryRouter, SearchOptions, StatusFilter, UnavailableSolver};

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
      <td class="name"><a href="/detail/102">ACME SERVICES LLC</a></td>
      <td class="number">L102</td>
      <td class="status">ACTIVE</td>
    </tr>
  </tbody></table>
</body></html>
"#;

const DETAIL_PAGE: &str = r#"
<html><body>
  <div class="entity">
    <span class="number">L100</span>
    <span class="status">ACTIVE</span>
    <span class="agent">REGISTERED AGENTS INC</span>
  </div>
</body></html>
"#;

fn test_config(base_url: &str) -> JurisdictionConfig {
    JurisdictionConfig {
        code: "xx".to_owned(),
        name: "Testland".to_owned(),
        registry_name: "Testland Business Search".to_owned(),
        tier: Tier::StaticHtml,
        base_url: base_url.to_owned(),
        api: None,
        scrape: Some(ScrapeSpec {
            search_url: format!("{base_url}/search"),
            officer_search_url: None,
            agent_search_url: None,
            address_search_url: None,
            detail_url_template: None,
            results: SearchResultSelectors {
                container: "table#results tbody".to_owned(),
                row: "tr".to_owned(),
                name: SelectorStrategy::css("td.name a")
                    .transform(ValueTransform::CollapseWhitespace),
                entity_number: Some(SelectorStrategy::css("td.number")),
                status: Some(
                    SelectorStrategy::css("td.status").transform(ValueTransform::NormalizeStatus),
                ),
                entity_type: None,
                formation_date: None,
                detail_link: Some(SelectorStrategy::css("td.name a").attr("href")),
                total_results: Some(SelectorStrategy::css("p.count").pattern(r"of\s+([\d,]+)")),
                next_page: None,
            },
            detail: Some(DetailPageSelectors {
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
                officers: None,
                filings: None,
            }),
            form_fields: vec![FormField::query(r#"input[name="q"]"#)],
            requires_js: false,
            wait_for: None,
            post_submit_delay_ms: None,
            submit: SubmitMethod::FormSubmit,
            submit_locator: None,
            captcha: None,
        }),
    }
}

fn test_app_config() -> AppConfig {
    AppConfig {
        // Generous budget so tests never sit in the limiter.
        rate_limit_per_minute: 600,
        detail_batch_delay_ms: 0,
        ..AppConfig::default()
    }
}

fn router_for(server: &MockServer, app: AppConfig) -> RegistryRouter {
    let registry = JurisdictionRegistry::new(vec![test_config(&server.uri())])
        .expect("test config validates");
    RegistryRouter::with_registry(registry, app, Arc::new(UnavailableSolver))
        .expect("router construction")
}

#[tokio::test]
async fn static_html_search_returns_parsed_entities() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
        .mount(&server)
        .await;
    let router = router_for(&server, test_app_config());

    let report = router
        .search_entity("xx", "acme", SearchOptions { limit: 5, ..SearchOptions::default() })
        .await;

    assert!(report.success, "error: {:?}", report.error);
    assert_eq!(report.jurisdiction, "xx");
    assert_eq!(report.entities.len(), 3);
    assert!(report.entities.iter().all(|e| !e.name.is_empty()));
    assert_eq!(report.total_found, 3);
    assert!(!report.from_cache);
    assert_eq!(report.entities[0].entity_number.as_deref(), Some("L100"));
    assert_eq!(report.entities[0].status.as_deref(), Some("Active"));
}

#[tokio::test]
async fn repeated_search_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
        .expect(1)
        .mount(&server)
        .await;
    let router = router_for(&server, test_app_config());
    let options = SearchOptions::default();

    let first = router.search_entity("xx", "acme", options).await;
    let second = router.search_entity("xx", "ACME", options).await;

    assert!(first.success && second.success);
    assert!(!first.from_cache);
    assert!(second.from_cache, "identical query must hit the cache");
    assert_eq!(
        first.entities.iter().map(|e| &e.name).collect::<Vec<_>>(),
        second.entities.iter().map(|e| &e.name).collect::<Vec<_>>()
    );
    server.verify().await;
}

#[tokio::test]
async fn skip_cache_refetches_but_still_writes_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
        .expect(2)
        .mount(&server)
        .await;
    let router = router_for(&server, test_app_config());
    let skip = SearchOptions { skip_cache: true, ..SearchOptions::default() };

    let first = router.search_entity("xx", "acme", skip).await;
    let second = router.search_entity("xx", "acme", skip).await;
    assert!(first.success && second.success);
    assert!(!second.from_cache);

    // The refreshed result was written back and serves non-skipping calls.
    let third = router
        .search_entity("xx", "acme", SearchOptions::default())
        .await;
    assert!(third.from_cache);
    server.verify().await;
}

#[tokio::test]
async fn status_filter_is_applied_to_scraped_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
        .mount(&server)
        .await;
    let router = router_for(&server, test_app_config());

    let report = router
        .search_entity(
            "xx",
            "acme",
            SearchOptions { status: StatusFilter::Active, ..SearchOptions::default() },
        )
        .await;

    assert!(report.success);
    assert_eq!(report.entities.len(), 2);
    assert!(report
        .entities
        .iter()
        .all(|e| e.status.as_deref() == Some("Active")));
}

#[tokio::test]
async fn detail_enrichment_merges_detail_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
        .mount(&server)
        .await;
    for id in ["100", "101", "102"] {
        Mock::given(method("GET"))
            .and(path(format!("/detail/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_PAGE))
            .mount(&server)
            .await;
    }
    let router = router_for(&server, test_app_config());

    let report = router
        .search_entity(
            "xx",
            "acme",
            SearchOptions { include_details: true, ..SearchOptions::default() },
        )
        .await;

    assert!(report.success, "error: {:?}", report.error);
    assert_eq!(report.entities.len(), 3);
    assert_eq!(
        report.entities[0].registered_agent.as_deref(),
        Some("Registered Agents Inc")
    );
}

#[tokio::test]
async fn failed_detail_fetch_keeps_the_search_entity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
        .mount(&server)
        .await;
    // Detail pages are not mounted: every fetch 404s.
    let router = router_for(&server, test_app_config());

    let report = router
        .search_entity(
            "xx",
            "acme",
            SearchOptions { include_details: true, ..SearchOptions::default() },
        )
        .await;

    assert!(report.success, "enrichment failure must not fail the search");
    assert_eq!(report.entities.len(), 3);
    assert_eq!(report.entities[0].name, "ACME LLC");
    assert_eq!(report.entities[0].registered_agent, None);
}

#[tokio::test]
async fn forced_open_circuit_short_circuits_without_a_request() {
    let server = MockServer::start().await;
    let router = router_for(&server, test_app_config());
    router.force_circuit_open("xx");

    let report = router
        .search_entity("xx", "acme", SearchOptions::default())
        .await;

    assert!(!report.success);
    assert!(report.entities.is_empty());
    let error = report.error.expect("error message present");
    assert!(error.contains("circuit open"), "got: {error}");
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty(), "no request may reach the target");
}

#[tokio::test]
async fn circuit_opens_after_consecutive_upstream_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let app = AppConfig { breaker_failure_threshold: 2, ..test_app_config() };
    let router = router_for(&server, app);
    // Distinct queries so the cache never interferes.
    let skip = SearchOptions { skip_cache: true, ..SearchOptions::default() };

    let first = router.search_entity("xx", "acme one", skip).await;
    let second = router.search_entity("xx", "acme two", skip).await;
    assert!(!first.success && !second.success);

    let third = router.search_entity("xx", "acme three", skip).await;
    assert!(!third.success);
    assert!(third.error.unwrap().contains("circuit open"));
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 2, "third call must not reach the target");
}

#[tokio::test]
async fn rotted_selectors_surface_as_a_parse_failure() {
    // The results table renders, but its markup no longer matches the
    // configured name strategy on any row.
    const ROTTED_PAGE: &str = r#"
    <html><body>
      <table id="results"><tbody>
        <tr><td class="renamed">ACME LLC</td></tr>
        <tr><td class="renamed">ACME HOLDINGS LLC</td></tr>
      </tbody></table>
    </body></html>
    "#;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ROTTED_PAGE))
        .mount(&server)
        .await;
    let router = router_for(&server, test_app_config());

    let report = router
        .search_entity("xx", "acme", SearchOptions::default())
        .await;

    assert!(!report.success, "selector rot must not pass as empty success");
    assert!(report.entities.is_empty());
    let error = report.error.expect("error message present");
    assert!(error.contains("no entity name resolvable"), "got: {error}");
}

#[tokio::test]
async fn unknown_jurisdiction_is_a_clean_failure() {
    let server = MockServer::start().await;
    let router = router_for(&server, test_app_config());

    let report = router
        .search_entity("zz", "acme", SearchOptions::default())
        .await;

    assert!(!report.success);
    assert!(report.error.unwrap().contains("zz"));
}

#[tokio::test]
async fn empty_query_fails_without_touching_the_network() {
    let server = MockServer::start().await;
    let router = router_for(&server, test_app_config());

    let report = router.search_entity("xx", "   ", SearchOptions::default()).await;

    assert!(!report.success);
    assert!(report.error.unwrap().contains("must not be empty"));
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}
