//! Flattens fetched ESG payloads into one row per entity.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

use crate::entity::{FetchedEntity, ScrapeResults};
use crate::lseg::{DEFAULT_LOOKUP_FIELD, DEFAULT_NAME_FIELD};
use crate::TARGET_WORKER;

pub const ESG_SCORE_CATEGORY: &str = "esgScore";
pub const INDUSTRY_COMPARISON_CATEGORY: &str = "industryComparison";

/// Descriptor fields read for the record's name and RIC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFields {
    pub name: String,
    pub ric: String,
}

impl Default for RecordFields {
    fn default() -> Self {
        RecordFields {
            name: DEFAULT_NAME_FIELD.to_string(),
            ric: DEFAULT_LOOKUP_FIELD.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EsgRecord {
    pub name: String,
    pub ext8_ticker: String,
    pub ticker: String,
    pub exchange: Option<String>,
    /// Score, weight and industry comparison columns, keyed by column name.
    #[serde(flatten)]
    pub scores: BTreeMap<String, Value>,
    pub timestamp_created_utc: DateTime<Utc>,
}

/// Builds one record per result, all stamped with `created_at`.
pub fn to_records(
    results: &ScrapeResults,
    fields: &RecordFields,
    created_at: DateTime<Utc>,
) -> Vec<EsgRecord> {
    results
        .iter()
        .filter_map(|(key, entity)| match construct_record(entity, fields, created_at) {
            Some(record) => Some(record),
            None => {
                warn!(
                    target: TARGET_WORKER,
                    "Skipping entity {}: missing {} or {} field", key, fields.name, fields.ric
                );
                None
            }
        })
        .collect()
}

/// `None` if the descriptor lacks the name or RIC field.
pub fn construct_record(
    entity: &FetchedEntity,
    fields: &RecordFields,
    created_at: DateTime<Utc>,
) -> Option<EsgRecord> {
    let name = entity.descriptor.field(&fields.name)?;
    let ric = entity.descriptor.field(&fields.ric)?;

    let mut scores = BTreeMap::new();
    if let Value::Object(categories) = &entity.payload {
        for (category, subfields) in categories {
            let Value::Object(subfields) = subfields else {
                continue;
            };
            match category.as_str() {
                INDUSTRY_COMPARISON_CATEGORY => {
                    for (field, value) in subfields {
                        scores.insert(field.to_lowercase(), value.clone());
                    }
                }
                ESG_SCORE_CATEGORY => {
                    for (field, value) in subfields {
                        let column = esg_column_name(field);
                        scores.insert(format!("{}_weight", column), member_or_zero(value, "weight"));
                        scores.insert(column, member_or_zero(value, "score"));
                    }
                }
                _ => {}
            }
        }
    }

    Some(EsgRecord {
        ticker: ticker_symbol(&ric).to_string(),
        exchange: exchange_suffix(&ric).map(str::to_string),
        name,
        ext8_ticker: ric,
        scores,
        timestamp_created_utc: created_at,
    })
}

/// `TR.TRESGCScore` → `esg_cscore`, `TR.EnvironmentPillar` → `esg_environment`.
pub fn esg_column_name(field: &str) -> String {
    let mut name = field.to_lowercase().replace("tr.", "");
    if name != "tresg" && name.contains("tresg") {
        name = name.replace("tresg", "");
    }
    if name.contains("pillar") {
        name = name.replace("pillar", "");
    }
    format!("esg_{}", name)
}

pub fn ticker_symbol(ric: &str) -> &str {
    ric.split('.').next().unwrap_or(ric)
}

pub fn exchange_suffix(ric: &str) -> Option<&str> {
    ric.rsplit_once('.').map(|(_, exchange)| exchange)
}

fn member_or_zero(value: &Value, member: &str) -> Value {
    value
        .as_object()
        .and_then(|object: &Map<String, Value>| object.get(member))
        .cloned()
        .unwrap_or_else(|| Value::from(0))
}
