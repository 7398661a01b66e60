//! Seams between the worker pool and the remote data provider.

use anyhow::Result;
use futures::future::BoxFuture;

use crate::entity::{EntityDescriptor, Payload};

/// Supplies the initial list of entities for a run.
pub trait TickerSource: Send + Sync {
    fn fetch_tickers(&self) -> BoxFuture<'_, Result<Vec<EntityDescriptor>>>;
}

/// Fetches the score payload for a single entity by its lookup code.
pub trait ScoreFetcher: Send + Sync {
    fn fetch_scores<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<Payload>>;
}
