//! Built-in jurisdiction table.
//!
//! Hand-authored, one entry per supported registry. Every site is
//! structurally unique, so there is nothing to infer: adding a jurisdiction
//! means adding a row here (tiers 1-3 are purely config-driven; tier 4
//! additionally exercises the browser engine's challenge path).
//!
//! The `tier2` factory keeps the common static-HTML shape down to the
//! fields that actually differ per state (URLs and a handful of selectors).
//! Selector strings mirror each registry's live markup and are expected to
//! rot; that is what fallback chains are for.

use crate::jurisdiction::{
    ApiSpec, CaptchaSpec, DetailPageSelectors, EntityField, FieldMapping, FormField,
    JurisdictionConfig, ScrapeSpec, SearchResultSelectors, SubListSelectors, SubmitMethod, Tier,
};
use crate::selector::{SelectorStrategy, ValueTransform};

/// All built-in jurisdiction configs, in code order.
#[must_use]
pub fn all() -> Vec<JurisdictionConfig> {
    vec![
        arizona(),
        california(),
        colorado(),
        delaware(),
        florida(),
        georgia(),
        illinois(),
        minnesota(),
        missouri(),
        nevada(),
        new_york(),
        north_carolina(),
        ohio(),
        washington(),
        wisconsin(),
    ]
}

/// Common results-table shape: a container, a repeated row, and the three
/// fields almost every registry's results table carries.
fn table_results(
    container: &str,
    row: &str,
    name: SelectorStrategy,
    entity_number: Option<SelectorStrategy>,
    status: Option<SelectorStrategy>,
) -> SearchResultSelectors {
    SearchResultSelectors {
        container: container.to_owned(),
        row: row.to_owned(),
        name,
        entity_number,
        status,
        entity_type: None,
        formation_date: None,
        detail_link: None,
        total_results: None,
        next_page: None,
    }
}

/// Factory for the common tier-2 shape: one GET-style search form, one
/// query input, server-rendered results.
fn tier2(
    code: &str,
    name: &str,
    registry_name: &str,
    base_url: &str,
    search_url: &str,
    query_locator: &str,
    results: SearchResultSelectors,
) -> JurisdictionConfig {
    JurisdictionConfig {
        code: code.to_owned(),
        name: name.to_owned(),
        registry_name: registry_name.to_owned(),
        tier: Tier::StaticHtml,
        base_url: base_url.to_owned(),
        api: None,
        scrape: Some(ScrapeSpec {
            search_url: search_url.to_owned(),
            officer_search_url: None,
            agent_search_url: None,
            address_search_url: None,
            detail_url_template: None,
            results,
            detail: None,
            form_fields: vec![FormField::query(query_locator)],
            requires_js: false,
            wait_for: None,
            post_submit_delay_ms: None,
            submit: SubmitMethod::FormSubmit,
            submit_locator: None,
            captcha: None,
        }),
    }
}

fn colorado() -> JurisdictionConfig {
    JurisdictionConfig {
        code: "co".to_owned(),
        name: "Colorado".to_owned(),
        registry_name: "Secretary of State Business Database".to_owned(),
        tier: Tier::OpenApi,
        base_url: "https://data.colorado.gov".to_owned(),
        api: Some(ApiSpec {
            endpoint: "https://data.colorado.gov/resource/4ykn-tg5h.json".to_owned(),
            name_field: "entityname".to_owned(),
            status_field: Some("entitystatus".to_owned()),
            order_field: Some("entityname".to_owned()),
            mappings: vec![
                FieldMapping {
                    source: "entityid".to_owned(),
                    target: EntityField::EntityNumber,
                },
                FieldMapping {
                    source: "entitystatus".to_owned(),
                    target: EntityField::Status,
                },
                FieldMapping {
                    source: "entitytype".to_owned(),
                    target: EntityField::EntityType,
                },
                FieldMapping {
                    source: "entityformdate".to_owned(),
                    target: EntityField::FormationDate,
                },
                FieldMapping {
                    source: "agentprincipalname".to_owned(),
                    target: EntityField::RegisteredAgent,
                },
            ],
            address_parts: vec![
                "principaladdress1".to_owned(),
                "principalcity".to_owned(),
                "principalstate".to_owned(),
                "principalzipcode".to_owned(),
            ],
        }),
        scrape: None,
    }
}

fn florida() -> JurisdictionConfig {
    let mut config = tier2(
        "fl",
        "Florida",
        "Division of Corporations (Sunbiz)",
        "https://search.sunbiz.org",
        "https://search.sunbiz.org/Inquiry/CorporationSearch/SearchResults",
        "input#SearchTerm",
        SearchResultSelectors {
            container: "div#search-results table tbody".to_owned(),
            row: "tr".to_owned(),
            name: SelectorStrategy::css("td.large-width a")
                .fallback("td:nth-child(1) a")
                .fallback("td:nth-child(1)")
                .transform(ValueTransform::CollapseWhitespace),
            entity_number: Some(
                SelectorStrategy::css("td.small-width").fallback("td:nth-child(2)"),
            ),
            status: Some(
                SelectorStrategy::css("td:nth-child(3)").transform(ValueTransform::NormalizeStatus),
            ),
            entity_type: None,
            formation_date: None,
            detail_link: Some(
                SelectorStrategy::css("td.large-width a")
                    .fallback("td:nth-child(1) a")
                    .attr("href"),
            ),
            total_results: Some(
                SelectorStrategy::css("div.search-results-header p")
                    .fallback("p.results-count")
                    .pattern(r"of\s+([\d,]+)"),
            ),
            next_page: Some(SelectorStrategy::css("a[title=\"Next List\"]").attr("href")),
        },
    );
    if let Some(scrape) = &mut config.scrape {
        scrape.officer_search_url = Some(
            "https://search.sunbiz.org/Inquiry/CorporationSearch/ByOfficerRegisteredAgentName"
                .to_owned(),
        );
        scrape.detail = Some(DetailPageSelectors {
            entity_number: Some(
                SelectorStrategy::css("div.detailSection span:nth-child(2)")
                    .pattern(r"([A-Z]?\d[\dA-Z]+)"),
            ),
            status: Some(
                SelectorStrategy::css("div.detailSection.corporationName + div span")
                    .fallback("div.detailSection span.status")
                    .transform(ValueTransform::NormalizeStatus),
            ),
            formation_date: Some(
                SelectorStrategy::css("div.detailSection span.filingDate")
                    .fallback("div.detailSection:nth-of-type(2) span:nth-child(4)")
                    .pattern(r"(\d{2}/\d{2}/\d{4})")
                    .transform(ValueTransform::NormalizeDate),
            ),
            entity_type: Some(SelectorStrategy::css("div.detailSection.corporationName p")),
            registered_address: Some(
                SelectorStrategy::css("div.detailSection span.principalAddress div")
                    .fallback("div.detailSection:nth-of-type(3) div")
                    .transform(ValueTransform::CollapseWhitespace),
            ),
            registered_agent: Some(
                SelectorStrategy::css("div.detailSection span.registeredAgentName")
                    .fallback("div.detailSection:nth-of-type(5) span:nth-child(2)")
                    .transform(ValueTransform::CollapseWhitespace),
            ),
            officers: Some(SubListSelectors {
                container: "div.detailSection.officers".to_owned(),
                row: "span.officer".to_owned(),
                first: SelectorStrategy::css("span.officerName")
                    .fallback("span:nth-child(2)")
                    .transform(ValueTransform::CollapseWhitespace),
                second: Some(
                    SelectorStrategy::css("span.officerTitle").fallback("span:nth-child(1)"),
                ),
                third: Some(SelectorStrategy::css("div.officerAddress")),
            }),
            filings: Some(SubListSelectors {
                container: "div.detailSection.filingHistory table tbody".to_owned(),
                row: "tr".to_owned(),
                first: SelectorStrategy::css("td:nth-child(1)"),
                second: Some(
                    SelectorStrategy::css("td:nth-child(2)")
                        .pattern(r"(\d{2}/\d{2}/\d{4})")
                        .transform(ValueTransform::NormalizeDate),
                ),
                third: Some(SelectorStrategy::css("td:nth-child(3)")),
            }),
        });
    }
    config
}

fn georgia() -> JurisdictionConfig {
    tier2(
        "ga",
        "Georgia",
        "Corporations Division",
        "https://ecorp.sos.ga.gov",
        "https://ecorp.sos.ga.gov/BusinessSearch",
        "input#txtBusinessName",
        table_results(
            "table#grid_businessList tbody",
            "tr",
            SelectorStrategy::css("td:nth-child(1) a")
                .fallback("td:nth-child(1)")
                .transform(ValueTransform::CollapseWhitespace),
            Some(SelectorStrategy::css("td:nth-child(2)")),
            Some(SelectorStrategy::css("td:nth-child(4)").transform(ValueTransform::NormalizeStatus)),
        ),
    )
}

fn illinois() -> JurisdictionConfig {
    tier2(
        "il",
        "Illinois",
        "Department of Business Services",
        "https://apps.ilsos.gov",
        "https://apps.ilsos.gov/businessentitysearch/businessentitysearch",
        "input[name=\"searchValue\"]",
        table_results(
            "table.resultsTable tbody",
            "tr",
            SelectorStrategy::css("td:nth-child(2) a")
                .fallback("td:nth-child(2)")
                .transform(ValueTransform::CollapseWhitespace),
            Some(SelectorStrategy::css("td:nth-child(1)")),
            Some(SelectorStrategy::css("td:nth-child(3)").transform(ValueTransform::NormalizeStatus)),
        ),
    )
}

fn missouri() -> JurisdictionConfig {
    tier2(
        "mo",
        "Missouri",
        "Corporations Unit",
        "https://bsd.sos.mo.gov",
        "https://bsd.sos.mo.gov/search/business",
        "input#BusinessName",
        table_results(
            "table#searchResults tbody",
            "tr",
            SelectorStrategy::css("td.entity-name a")
                .fallback("td:nth-child(1)")
                .transform(ValueTransform::CollapseWhitespace),
            Some(SelectorStrategy::css("td.charter-number").fallback("td:nth-child(2)")),
            Some(SelectorStrategy::css("td.status").transform(ValueTransform::NormalizeStatus)),
        ),
    )
}

fn minnesota() -> JurisdictionConfig {
    tier2(
        "mn",
        "Minnesota",
        "Business & Liens",
        "https://mblsportal.sos.mn.gov",
        "https://mblsportal.sos.mn.gov/Business/Search",
        "input#BusinessName",
        table_results(
            "div.searchResults table tbody",
            "tr",
            SelectorStrategy::css("td:nth-child(1) a")
                .fallback("td:nth-child(1)")
                .transform(ValueTransform::CollapseWhitespace),
            None,
            Some(SelectorStrategy::css("td:nth-child(3)").transform(ValueTransform::NormalizeStatus)),
        ),
    )
}

fn arizona() -> JurisdictionConfig {
    tier2(
        "az",
        "Arizona",
        "Corporation Commission",
        "https://ecorp.azcc.gov",
        "https://ecorp.azcc.gov/EntitySearch/Index",
        "input#quickSearch_BusinessName",
        table_results(
            "table#grid_resultsList tbody",
            "tr",
            SelectorStrategy::css("td[data-title=\"Name\"] a")
                .fallback("td:nth-child(2)")
                .transform(ValueTransform::CollapseWhitespace),
            Some(SelectorStrategy::css("td[data-title=\"Entity ID\"]").fallback("td:nth-child(1)")),
            Some(
                SelectorStrategy::css("td[data-title=\"Entity Status\"]")
                    .transform(ValueTransform::NormalizeStatus),
            ),
        ),
    )
}

fn north_carolina() -> JurisdictionConfig {
    tier2(
        "nc",
        "North Carolina",
        "Business Registration Division",
        "https://www.sosnc.gov",
        "https://www.sosnc.gov/online_services/search/by_title/_Business_Registration",
        "input#SearchCriteria",
        table_results(
            "table.search-results tbody",
            "tr",
            SelectorStrategy::css("td a.link")
                .fallback("td:nth-child(1)")
                .transform(ValueTransform::CollapseWhitespace),
            Some(SelectorStrategy::css("td:nth-child(3)")),
            Some(SelectorStrategy::css("td:nth-child(2)").transform(ValueTransform::NormalizeStatus)),
        ),
    )
}

fn ohio() -> JurisdictionConfig {
    tier2(
        "oh",
        "Ohio",
        "Businesses (Secretary of State)",
        "https://businesssearch.ohiosos.gov",
        "https://businesssearch.ohiosos.gov/search",
        "input#bSearch",
        table_results(
            "table#business_results tbody",
            "tr",
            SelectorStrategy::css("td:nth-child(2) a")
                .fallback("td:nth-child(2)")
                .transform(ValueTransform::CollapseWhitespace),
            Some(SelectorStrategy::css("td:nth-child(1)")),
            Some(SelectorStrategy::css("td:nth-child(4)").transform(ValueTransform::NormalizeStatus)),
        ),
    )
}

fn wisconsin() -> JurisdictionConfig {
    tier2(
        "wi",
        "Wisconsin",
        "Department of Financial Institutions",
        "https://apps.dfi.wi.gov",
        "https://apps.dfi.wi.gov/apps/corpsearch/Search.aspx",
        "input#ctl00_cpContent_txtSearchString",
        table_results(
            "table#results tbody",
            "tr",
            SelectorStrategy::css("td:nth-child(1) a")
                .fallback("td:nth-child(1)")
                .transform(ValueTransform::CollapseWhitespace),
            Some(SelectorStrategy::css("td:nth-child(2)")),
            Some(SelectorStrategy::css("td:nth-child(3)").transform(ValueTransform::NormalizeStatus)),
        ),
    )
}

fn california() -> JurisdictionConfig {
    JurisdictionConfig {
        code: "ca".to_owned(),
        name: "California".to_owned(),
        registry_name: "bizfile Online".to_owned(),
        tier: Tier::ScriptRendered,
        base_url: "https://bizfileonline.sos.ca.gov".to_owned(),
        api: None,
        scrape: Some(ScrapeSpec {
            search_url: "https://bizfileonline.sos.ca.gov/search/business".to_owned(),
            officer_search_url: None,
            agent_search_url: None,
            address_search_url: None,
            detail_url_template: None,
            results: SearchResultSelectors {
                container: "div.search-results table tbody".to_owned(),
                row: "tr.interactive-row".to_owned(),
                name: SelectorStrategy::css("td.first-td button")
                    .fallback("td:nth-child(1)")
                    .transform(ValueTransform::CollapseWhitespace),
                entity_number: Some(SelectorStrategy::css("td:nth-child(2)")),
                status: Some(
                    SelectorStrategy::css("td:nth-child(4)")
                        .transform(ValueTransform::NormalizeStatus),
                ),
                entity_type: Some(SelectorStrategy::css("td:nth-child(5)")),
                formation_date: Some(
                    SelectorStrategy::css("td:nth-child(3)").pattern(r"(\d{2}/\d{2}/\d{4})"),
                ),
                detail_link: None,
                total_results: Some(
                    SelectorStrategy::css("div.result-count").pattern(r"([\d,]+)\s+results"),
                ),
                next_page: None,
            },
            detail: None,
            form_fields: vec![FormField::query("input.search-input")],
            requires_js: true,
            wait_for: Some("div.search-results".to_owned()),
            post_submit_delay_ms: Some(1200),
            submit: SubmitMethod::PressEnter,
            submit_locator: None,
            captcha: None,
        }),
    }
}

fn new_york() -> JurisdictionConfig {
    JurisdictionConfig {
        code: "ny".to_owned(),
        name: "New York".to_owned(),
        registry_name: "Department of State Corporation & Business Entity Database".to_owned(),
        tier: Tier::ScriptRendered,
        base_url: "https://apps.dos.ny.gov".to_owned(),
        api: None,
        scrape: Some(ScrapeSpec {
            search_url: "https://apps.dos.ny.gov/publicInquiry/".to_owned(),
            officer_search_url: None,
            agent_search_url: None,
            address_search_url: None,
            detail_url_template: None,
            results: SearchResultSelectors {
                container: "table#tblResults tbody".to_owned(),
                row: "tr".to_owned(),
                name: SelectorStrategy::css("td:nth-child(1) a")
                    .fallback("td:nth-child(1)")
                    .transform(ValueTransform::CollapseWhitespace),
                entity_number: Some(SelectorStrategy::css("td:nth-child(2)")),
                status: None,
                entity_type: Some(SelectorStrategy::css("td:nth-child(3)")),
                formation_date: Some(
                    SelectorStrategy::css("td:nth-child(4)").pattern(r"(\d{2}/\d{2}/\d{4})"),
                ),
                detail_link: None,
                total_results: None,
                next_page: Some(SelectorStrategy::css("a#lnkNextPage").attr("href")),
            },
            detail: None,
            form_fields: vec![FormField::query("input#txtSearchValue")],
            requires_js: true,
            wait_for: Some("input#txtSearchValue".to_owned()),
            post_submit_delay_ms: Some(800),
            submit: SubmitMethod::Click,
            submit_locator: Some("button#btnSearch".to_owned()),
            captcha: None,
        }),
    }
}

fn washington() -> JurisdictionConfig {
    JurisdictionConfig {
        code: "wa".to_owned(),
        name: "Washington".to_owned(),
        registry_name: "Corporations & Charities Filing System".to_owned(),
        tier: Tier::ScriptRendered,
        base_url: "https://ccfs.sos.wa.gov".to_owned(),
        api: None,
        scrape: Some(ScrapeSpec {
            search_url: "https://ccfs.sos.wa.gov/#/BusinessSearch".to_owned(),
            officer_search_url: None,
            agent_search_url: None,
            address_search_url: None,
            detail_url_template: None,
            results: SearchResultSelectors {
                container: "table.table-striped tbody".to_owned(),
                row: "tr".to_owned(),
                name: SelectorStrategy::css("td:nth-child(2) a")
                    .fallback("td:nth-child(2)")
                    .transform(ValueTransform::CollapseWhitespace),
                entity_number: Some(SelectorStrategy::css("td:nth-child(1)")),
                status: Some(
                    SelectorStrategy::css("td:nth-child(4)")
                        .transform(ValueTransform::NormalizeStatus),
                ),
                entity_type: Some(SelectorStrategy::css("td:nth-child(3)")),
                formation_date: None,
                detail_link: None,
                total_results: None,
                next_page: None,
            },
            detail: None,
            form_fields: vec![FormField::query("input#BusinessName")],
            requires_js: true,
            wait_for: Some("input#BusinessName".to_owned()),
            post_submit_delay_ms: Some(1000),
            submit: SubmitMethod::Click,
            submit_locator: Some("button.btn-primary".to_owned()),
            captcha: None,
        }),
    }
}

fn delaware() -> JurisdictionConfig {
    JurisdictionConfig {
        code: "de".to_owned(),
        name: "Delaware".to_owned(),
        registry_name: "Division of Corporations (ICIS)".to_owned(),
        tier: Tier::CaptchaProtected,
        base_url: "https://icis.corp.delaware.gov".to_owned(),
        api: None,
        scrape: Some(ScrapeSpec {
            search_url: "https://icis.corp.delaware.gov/eCorp/EntitySearch/NameSearch.aspx"
                .to_owned(),
            officer_search_url: None,
            agent_search_url: None,
            address_search_url: None,
            detail_url_template: None,
            results: SearchResultSelectors {
                container: "table#tblResults tbody".to_owned(),
                row: "tr".to_owned(),
                name: SelectorStrategy::css("td:nth-child(2) a")
                    .fallback("td:nth-child(2)")
                    .transform(ValueTransform::CollapseWhitespace),
                entity_number: Some(SelectorStrategy::css("td:nth-child(1)")),
                status: None,
                entity_type: None,
                formation_date: None,
                detail_link: None,
                total_results: None,
                next_page: None,
            },
            detail: None,
            form_fields: vec![FormField::query("input#ctl00_ContentPlaceHolder1_frmEntityName")],
            requires_js: true,
            wait_for: Some("input#ctl00_ContentPlaceHolder1_frmEntityName".to_owned()),
            post_submit_delay_ms: Some(1500),
            submit: SubmitMethod::Click,
            submit_locator: Some("input#ctl00_ContentPlaceHolder1_btnSubmit".to_owned()),
            captcha: Some(CaptchaSpec {
                image_locator: "img#ctl00_ContentPlaceHolder1_captchaImage".to_owned(),
                input_locator: "input#ctl00_ContentPlaceHolder1_captchaTextBox".to_owned(),
                submit_locator: None,
            }),
        }),
    }
}

fn nevada() -> JurisdictionConfig {
    JurisdictionConfig {
        code: "nv".to_owned(),
        name: "Nevada".to_owned(),
        registry_name: "SilverFlume Business Portal".to_owned(),
        tier: Tier::CaptchaProtected,
        base_url: "https://esos.nv.gov".to_owned(),
        api: None,
        scrape: Some(ScrapeSpec {
            search_url: "https://esos.nv.gov/EntitySearch/OnlineEntitySearch".to_owned(),
            officer_search_url: None,
            agent_search_url: None,
            address_search_url: None,
            detail_url_template: None,
            results: SearchResultSelectors {
                container: "table#grid_businessList tbody".to_owned(),
                row: "tr".to_owned(),
                name: SelectorStrategy::css("td[data-title=\"Entity Name\"] a")
                    .fallback("td:nth-child(1)")
                    .transform(ValueTransform::CollapseWhitespace),
                entity_number: Some(
                    SelectorStrategy::css("td[data-title=\"NV Business ID\"]")
                        .fallback("td:nth-child(2)"),
                ),
                status: Some(
                    SelectorStrategy::css("td[data-title=\"Entity Status\"]")
                        .transform(ValueTransform::NormalizeStatus),
                ),
                entity_type: Some(SelectorStrategy::css("td[data-title=\"Entity Type\"]")),
                formation_date: None,
                detail_link: None,
                total_results: None,
                next_page: None,
            },
            detail: None,
            form_fields: vec![FormField::query("input#BusinessSearch_Index_txtEntityName")],
            requires_js: true,
            wait_for: Some("input#BusinessSearch_Index_txtEntityName".to_owned()),
            post_submit_delay_ms: Some(1200),
            submit: SubmitMethod::Click,
            submit_locator: Some("input#btnSearch".to_owned()),
            captcha: Some(CaptchaSpec {
                image_locator: "img.captcha-image".to_owned(),
                input_locator: "input#CaptchaCode".to_owned(),
                submit_locator: None,
            }),
        }),
    }
}
