//! HTTP client for the LSEG ESG search endpoints.

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use reqwest::{cookie::Jar, header};
use serde_json::Value;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{debug, error, info};
use url::Url;

use super::types::{RESULT_PATH, RIC_PARAM, SUGGESTIONS_PATH, USER_AGENT};
use crate::entity::{EntityDescriptor, Payload};
use crate::source::{ScoreFetcher, TickerSource};
use crate::TARGET_WEB_REQUEST;

/// Create the session shared by every request of a run.
pub fn create_http_client(request_timeout: Duration) -> Result<reqwest::Client> {
    let cookie_store = Jar::default();
    debug!(target: TARGET_WEB_REQUEST, "Creating HTTP client with {}s timeout", request_timeout.as_secs());

    reqwest::Client::builder()
        .cookie_store(true)
        .cookie_provider(Arc::new(cookie_store))
        .gzip(true)
        .user_agent(USER_AGENT)
        .timeout(request_timeout)
        .redirect(reqwest::redirect::Policy::default())
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))
}

pub struct LsegClient {
    http: reqwest::Client,
    base_url: Url,
}

impl LsegClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        info!(target: TARGET_WEB_REQUEST, "Initializing LSEG client for {}", base_url);
        Self::with_http(create_http_client(request_timeout)?, base_url)
    }

    /// Uses an already configured session.
    pub fn with_http(http: reqwest::Client, base_url: &str) -> Result<Self> {
        Ok(LsegClient {
            http,
            base_url: parse_base_url(base_url)?,
        })
    }

    pub fn tickers_url(&self) -> Result<Url> {
        self.base_url
            .join(SUGGESTIONS_PATH)
            .context("Failed to build ticker list URL")
    }

    pub fn scores_url(&self, ric: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(RESULT_PATH)
            .context("Failed to build score URL")?;
        url.query_pairs_mut().append_pair(RIC_PARAM, ric);
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        debug!(target: TARGET_WEB_REQUEST, "GET {}", url);
        let response = self
            .http
            .get(url.clone())
            .header(header::ACCEPT, "application/json, text/plain, */*")
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let response = response
            .error_for_status()
            .with_context(|| format!("Non-success status from {}", url))?;

        response
            .json::<Value>()
            .await
            .with_context(|| format!("Failed to decode JSON from {}", url))
    }
}

/// `Url::join` drops the last path segment unless the base ends with a slash.
fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base).with_context(|| format!("Invalid base URL: {}", base_url))
}

fn parse_tickers(body: Value) -> Result<Vec<EntityDescriptor>> {
    match body {
        Value::Array(items) => items
            .into_iter()
            .map(EntityDescriptor::try_from)
            .collect::<Result<Vec<_>>>()
            .context("Ticker list contains a non-object entry"),
        other => Err(anyhow::anyhow!(
            "Ticker list is not an array: {}",
            truncate(&other.to_string(), 200)
        )),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

impl TickerSource for LsegClient {
    fn fetch_tickers(&self) -> BoxFuture<'_, Result<Vec<EntityDescriptor>>> {
        async move {
            let url = self.tickers_url()?;
            info!(target: TARGET_WEB_REQUEST, "Fetching tickers from {}", url);
            let tickers = match self.get_json(url).await.and_then(parse_tickers) {
                Ok(tickers) => tickers,
                Err(err) => {
                    error!(target: TARGET_WEB_REQUEST, "Failed to fetch tickers: {:#}", err);
                    return Err(err);
                }
            };
            info!(target: TARGET_WEB_REQUEST, "Successfully fetched {} tickers", tickers.len());
            Ok(tickers)
        }
        .boxed()
    }
}

impl ScoreFetcher for LsegClient {
    fn fetch_scores<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<Payload>> {
        async move {
            let url = self.scores_url(code)?;
            self.get_json(url).await
        }
        .boxed()
    }
}
