use super::*;
use crate::jurisdiction::{
    ApiSpec, FormField, ScrapeSpec, SearchResultSelectors, SubmitMethod,
};
use crate::selector::SelectorStrategy;

fn minimal_results() -> SearchResultSelectors {
    SearchResultSelectors {
        container: "table tbody".to_owned(),
        row: "tr".to_owned(),
        name: SelectorStrategy::css("td:nth-child(1)"),
        entity_number: None,
        status: None,
        entity_type: None,
        formation_date: None,
        detail_link: None,
        total_results: None,
        next_page: None,
    }
}

fn minimal_scrape() -> ScrapeSpec {
    ScrapeSpec {
        search_url: "https://registry.example.gov/search".to_owned(),
        officer_search_url: None,
        agent_search_url: None,
        address_search_url: None,
        detail_url_template: None,
        results: minimal_results(),
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

fn tier2_config(code: &str) -> JurisdictionConfig {
    JurisdictionConfig {
        code: code.to_owned(),
        name: "Testland".to_owned(),
        registry_name: "Registry of Testland".to_owned(),
        tier: Tier::StaticHtml,
        base_url: "https://registry.example.gov".to_owned(),
        api: None,
        scrape: Some(minimal_scrape()),
    }
}

#[test]
fn every_builtin_jurisdiction_validates_clean() {
    for config in crate::jurisdictions::all() {
        let violations = JurisdictionRegistry::validate(&config);
        assert!(
            violations.is_empty(),
            "jurisdiction {} has violations: {violations:?}",
            config.code
        );
    }
}

#[test]
fn builtin_covers_all_four_tiers() {
    let registry = JurisdictionRegistry::builtin().unwrap();
    for tier in [
        Tier::OpenApi,
        Tier::StaticHtml,
        Tier::ScriptRendered,
        Tier::CaptchaProtected,
    ] {
        assert!(
            registry.all().iter().any(|c| c.tier == tier),
            "no builtin jurisdiction at tier {}",
            tier.as_number()
        );
    }
}

#[test]
fn get_normalizes_code_case_and_whitespace() {
    let registry = JurisdictionRegistry::builtin().unwrap();
    assert_eq!(registry.get(" FL ").unwrap().code, "fl");
}

#[test]
fn get_unknown_code_is_an_error() {
    let registry = JurisdictionRegistry::builtin().unwrap();
    let err = registry.get("zz").unwrap_err();
    assert!(matches!(err, ConfigError::UnknownJurisdiction(code) if code == "zz"));
}

#[test]
fn tier1_without_api_spec_is_invalid() {
    let config = JurisdictionConfig {
        tier: Tier::OpenApi,
        api: None,
        ..tier2_config("t1")
    };
    let violations = JurisdictionRegistry::validate(&config);
    assert!(violations.iter().any(|v| v.contains("ApiSpec")));
}

#[test]
fn tier2_without_scrape_spec_is_invalid() {
    let mut config = tier2_config("t2");
    config.scrape = None;
    let violations = JurisdictionRegistry::validate(&config);
    assert!(violations.iter().any(|v| v.contains("ScrapeSpec")));
}

#[test]
fn tier4_without_captcha_spec_is_invalid() {
    let mut config = tier2_config("t4");
    config.tier = Tier::CaptchaProtected;
    let violations = JurisdictionRegistry::validate(&config);
    assert!(violations.iter().any(|v| v.contains("CaptchaSpec")));
}

#[test]
fn unparseable_selector_is_reported() {
    let mut config = tier2_config("bad");
    if let Some(scrape) = &mut config.scrape {
        scrape.results.name = SelectorStrategy::css("td:::nope");
    }
    let violations = JurisdictionRegistry::validate(&config);
    assert!(violations.iter().any(|v| v.contains("unparseable CSS locator")));
}

#[test]
fn uncompilable_pattern_is_reported() {
    let mut config = tier2_config("bad");
    if let Some(scrape) = &mut config.scrape {
        scrape.results.name = SelectorStrategy::css("td").pattern("([unclosed");
    }
    let violations = JurisdictionRegistry::validate(&config);
    assert!(violations.iter().any(|v| v.contains("uncompilable pattern")));
}

#[test]
fn detail_template_without_placeholder_is_reported() {
    let mut config = tier2_config("bad");
    if let Some(scrape) = &mut config.scrape {
        scrape.detail_url_template = Some("https://registry.example.gov/detail".to_owned());
    }
    let violations = JurisdictionRegistry::validate(&config);
    assert!(violations.iter().any(|v| v.contains("{id}")));
}

#[test]
fn click_submit_without_locator_is_reported() {
    let mut config = tier2_config("bad");
    if let Some(scrape) = &mut config.scrape {
        scrape.submit = SubmitMethod::Click;
    }
    let violations = JurisdictionRegistry::validate(&config);
    assert!(violations.iter().any(|v| v.contains("submit_locator")));
}

#[test]
fn new_rejects_invalid_table() {
    let config = JurisdictionConfig {
        tier: Tier::OpenApi,
        api: None,
        ..tier2_config("t1")
    };
    let err = JurisdictionRegistry::new(vec![config]).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidJurisdiction { code, .. } if code == "t1"));
}

#[test]
fn api_spec_round_trips_through_serde() {
    let api = ApiSpec {
        endpoint: "https://data.example.gov/resource/abcd-1234.json".to_owned(),
        name_field: "entityname".to_owned(),
        status_field: None,
        order_field: None,
        mappings: Vec::new(),
        address_parts: Vec::new(),
    };
    let json = serde_json::to_string(&api).unwrap();
    let back: ApiSpec = serde_json::from_str(&json).unwrap();
    assert_eq!(back, api);
}
