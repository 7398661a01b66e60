use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use tokio::time::Duration;

use crate::lseg::{DEFAULT_BASE_URL, DEFAULT_LOOKUP_FIELD, DEFAULT_NAME_FIELD, REQUEST_TIMEOUT};
use crate::pool::{available_cpus, PoolLayout, DEFAULT_THREAD_COUNT};
use crate::transform::RecordFields;

pub const DEFAULT_DATABASE_PATH: &str = "esg.db";
pub const DEFAULT_OUTPUT_TABLE: &str = "esg_scores";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Runtime settings, read from the environment and optionally overridden on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperConfig {
    /// `ESG_BASE_URL`
    pub base_url: String,
    /// `ESG_THREAD_COUNT`: inner workers per outer unit.
    pub threads: usize,
    /// `ESG_PROCESS_COUNT`: outer units, one per CPU by default.
    pub processes: usize,
    /// `ESG_REQUEST_TIMEOUT_SECS`
    pub request_timeout: Duration,
    /// `ESG_LOOKUP_FIELD`: descriptor field sent as the RIC.
    pub lookup_field: String,
    /// `ESG_NAME_FIELD`: descriptor field stored as the record name.
    pub name_field: String,
    /// `DATABASE_PATH`
    pub database_path: String,
    /// `OUTPUT_TABLE`
    pub output_table: String,
    /// `LOG_DIR`
    pub log_dir: String,
}

impl ScraperConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds the config from any variable lookup; unset or blank variables take their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(ScraperConfig {
            base_url: get("ESG_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            threads: parse_var(&get, "ESG_THREAD_COUNT")?.unwrap_or(DEFAULT_THREAD_COUNT),
            processes: parse_var(&get, "ESG_PROCESS_COUNT")?.unwrap_or_else(available_cpus),
            request_timeout: parse_var(&get, "ESG_REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(REQUEST_TIMEOUT),
            lookup_field: get("ESG_LOOKUP_FIELD")
                .unwrap_or_else(|| DEFAULT_LOOKUP_FIELD.to_string()),
            name_field: get("ESG_NAME_FIELD").unwrap_or_else(|| DEFAULT_NAME_FIELD.to_string()),
            database_path: get("DATABASE_PATH")
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            output_table: get("OUTPUT_TABLE").unwrap_or_else(|| DEFAULT_OUTPUT_TABLE.to_string()),
            log_dir: get("LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()),
        })
    }

    pub fn layout(&self) -> PoolLayout {
        PoolLayout::new(self.processes, self.threads)
    }

    /// The RIC comes from the same field the workers look up.
    pub fn record_fields(&self) -> RecordFields {
        RecordFields {
            name: self.name_field.clone(),
            ric: self.lookup_field.clone(),
        }
    }
}

/// Parses a variable if it is set, naming the variable in the error otherwise.
fn parse_var<T, G>(get: &G, var: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    get(var)
        .map(|value| {
            value
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: {:?}", var, value))
        })
        .transpose()
}
