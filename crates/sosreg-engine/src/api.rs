//! Tier-1 execution: open-data API queries.
//!
//! For jurisdictions that publish their registry as an open dataset
//! (Socrata-style SoQL endpoints), searching is a filtered JSON query plus
//! a declarative field mapping — no HTML involved.

use std::time::Duration;

use reqwest::Client;

use sosreg_core::{ApiSpec, EntityField, JurisdictionConfig, ScrapedEntity, ValueTransform};

use crate::error::ScrapeError;
use crate::report::{RowRecord, SearchOptions, SearchOutcome, StatusFilter};

pub struct ApiEngine {
    client: Client,
}

impl ApiEngine {
    /// # Errors
    ///
    /// Returns [`ScrapeError::Transport`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Runs a filtered query against the jurisdiction's open-data endpoint
    /// and maps rows into entities.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::Transport`] — network/DNS/TLS failure or timeout.
    /// - [`ScrapeError::UnexpectedStatus`] — non-2xx response.
    /// - [`ScrapeError::Deserialize`] — response body is not a JSON array.
    ///
    /// Failures are not retried here; retry policy, if any, belongs to the
    /// caller.
    pub async fn search(
        &self,
        config: &JurisdictionConfig,
        api: &ApiSpec,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchOutcome, ScrapeError> {
        let where_clause = build_where_clause(api, query, options.status);
        let limit = options.limit.to_string();
        let mut params = vec![("$where", where_clause.as_str()), ("$limit", limit.as_str())];
        if let Some(order) = &api.order_field {
            params.push(("$order", order.as_str()));
        }

        tracing::debug!(
            code = %config.code,
            endpoint = %api.endpoint,
            %where_clause,
            "issuing open-data query"
        );

        let response = self
            .client
            .get(&api.endpoint)
            .query(&params)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                status: status.as_u16(),
                url: api.endpoint.clone(),
            });
        }

        let body = response.text().await?;
        let records: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_str(&body).map_err(|e| ScrapeError::Deserialize {
                context: format!("open-data rows from {}", api.endpoint),
                source: e,
            })?;

        let rows: Vec<RowRecord> = records
            .iter()
            .filter_map(|record| map_record(record, config, api))
            .map(|entity| RowRecord {
                entity,
                detail_url: None,
            })
            .collect();

        let total_found = u32::try_from(rows.len()).unwrap_or(u32::MAX);
        Ok(SearchOutcome { rows, total_found })
    }
}

/// SoQL filter: case-insensitive name contains, plus an optional status
/// predicate. Single quotes in the query are doubled per SoQL string
/// escaping.
fn build_where_clause(api: &ApiSpec, query: &str, status: StatusFilter) -> String {
    let escaped = query.trim().replace('\'', "''").to_uppercase();
    let mut clause = format!("upper({}) like '%{escaped}%'", api.name_field);
    if let Some(status_field) = &api.status_field {
        match status {
            StatusFilter::Active => {
                clause.push_str(&format!(
                    " AND (upper({status_field}) like 'ACT%' OR upper({status_field}) like 'GOOD%')"
                ));
            }
            StatusFilter::Inactive => {
                clause.push_str(&format!(
                    " AND NOT (upper({status_field}) like 'ACT%' OR upper({status_field}) like 'GOOD%')"
                ));
            }
            StatusFilter::Any => {}
        }
    }
    clause
}

/// Applies the declarative field mappings to one API row. Rows without a
/// non-empty name are dropped — same rule as HTML extraction.
fn map_record(
    record: &serde_json::Map<String, serde_json::Value>,
    config: &JurisdictionConfig,
    api: &ApiSpec,
) -> Option<ScrapedEntity> {
    let name = string_field(record, &api.name_field)?;
    let mut entity = ScrapedEntity::new(name, &config.code, api.endpoint.clone());

    for mapping in &api.mappings {
        let Some(value) = string_field(record, &mapping.source) else {
            continue;
        };
        match mapping.target {
            EntityField::EntityNumber => entity.entity_number = Some(value),
            EntityField::Status => {
                entity.status = Some(ValueTransform::NormalizeStatus.apply(&value));
            }
            EntityField::FormationDate => entity.formation_date = Some(value),
            EntityField::EntityType => entity.entity_type = Some(value),
            EntityField::RegisteredAgent => entity.registered_agent = Some(value),
            EntityField::RegisteredAddress => entity.registered_address = Some(value),
        }
    }

    if !api.address_parts.is_empty() {
        let composite: Vec<String> = api
            .address_parts
            .iter()
            .filter_map(|part| string_field(record, part))
            .collect();
        if !composite.is_empty() {
            entity.registered_address = Some(composite.join(", "));
        }
    }

    Some(entity)
}

fn string_field(
    record: &serde_json::Map<String, serde_json::Value>,
    field: &str,
) -> Option<String> {
    let value = record.get(field)?;
    let text = match value {
        serde_json::Value::String(s) => s.trim().to_owned(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
