//! Drives one scrape: ticker list, worker pool, results.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use crate::entity::ScrapeResults;
use crate::pool::{PoolLayout, ResultStore, TaskQueue, WorkerContext, WorkerPool};
use crate::source::{ScoreFetcher, TickerSource};
use crate::TARGET_WORKER;

pub struct Scraper {
    source: Arc<dyn TickerSource>,
    fetcher: Arc<dyn ScoreFetcher>,
    layout: PoolLayout,
    lookup_field: Arc<str>,
}

impl Scraper {
    pub fn new(
        source: Arc<dyn TickerSource>,
        fetcher: Arc<dyn ScoreFetcher>,
        layout: PoolLayout,
        lookup_field: &str,
    ) -> Self {
        Scraper {
            source,
            fetcher,
            layout,
            lookup_field: Arc::from(lookup_field),
        }
    }

    /// Fetches the ticker list, fans the entities out over the pool and returns what was fetched.
    ///
    /// Fails only if the ticker list cannot be obtained, in which case no worker is started.
    /// Entities whose scores could not be fetched are simply missing from the result.
    pub async fn run(&self) -> Result<ScrapeResults> {
        info!(target: TARGET_WORKER, "Scrape run started");

        let tickers = match self.source.fetch_tickers().await {
            Ok(tickers) => tickers,
            Err(err) => {
                error!(target: TARGET_WORKER, "Failed to fetch tickers: {:#}", err);
                return Err(err.context("Failed to fetch ticker list"));
            }
        };
        info!(target: TARGET_WORKER, "Fetched {} RICs", tickers.len());

        let queue = Arc::new(TaskQueue::new(tickers));
        let store = Arc::new(ResultStore::new());
        let context = WorkerContext {
            queue,
            store: store.clone(),
            fetcher: self.fetcher.clone(),
            lookup_field: self.lookup_field.clone(),
        };

        let summary = WorkerPool::new(self.layout, context).run().await;
        info!(
            target: TARGET_WORKER,
            "All {} workers have completed: {} fetched, {} duplicates skipped, {} failed",
            summary.workers,
            summary.fetched,
            summary.skipped,
            summary.failed
        );
        if summary.panicked > 0 {
            error!(target: TARGET_WORKER, "{} workers terminated abnormally", summary.panicked);
        }

        let results = match Arc::try_unwrap(store) {
            Ok(store) => store.into_results(),
            Err(shared) => shared.snapshot(),
        };
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityDescriptor;
    use crate::test_utils::{entity, esg_payload, key, FakeFetcher, FakeSource};
    use serde_json::json;

    fn scraper(source: Arc<FakeSource>, fetcher: Arc<FakeFetcher>) -> Scraper {
        Scraper::new(source, fetcher, PoolLayout::new(2, 3), "code")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_two_entities_both_fetched() {
        let payload = esg_payload(80);
        let source = Arc::new(FakeSource::with_tickers(vec![
            entity(1, "AAA.O"),
            entity(2, "BBB.N"),
        ]));
        let fetcher = Arc::new(
            FakeFetcher::new()
                .with_payload("AAA.O", payload.clone())
                .with_payload("BBB.N", payload.clone()),
        );

        let results = scraper(source, fetcher).run().await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.values().all(|fetched| fetched.payload == payload));
        assert_eq!(results[&key(2, "BBB.N")].descriptor, entity(2, "BBB.N"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_duplicate_entity_yields_one_entry() {
        let source = Arc::new(FakeSource::with_tickers(vec![
            entity(1, "AAA.O"),
            entity(1, "AAA.O"),
        ]));
        let fetcher = Arc::new(FakeFetcher::new().with_payload("AAA.O", esg_payload(80)));

        let results = scraper(source, fetcher.clone()).run().await.unwrap();

        assert_eq!(results.len(), 1);
        assert!(results.contains_key(&key(1, "AAA.O")));
        assert!(fetcher.calls("AAA.O") <= 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_number_and_text_ids_are_different_entities() {
        let text_id = EntityDescriptor::try_from(json!({"id": "1", "code": "AAA.O"})).unwrap();
        let source = Arc::new(FakeSource::with_tickers(vec![entity(1, "AAA.O"), text_id]));
        let fetcher = Arc::new(FakeFetcher::new().with_payload("AAA.O", esg_payload(80)));

        let results = scraper(source, fetcher.clone()).run().await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(fetcher.calls("AAA.O"), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_entity_is_omitted() {
        let source = Arc::new(FakeSource::with_tickers(vec![
            entity(1, "AAA.O"),
            entity(2, "BAD.X"),
        ]));
        let fetcher = Arc::new(FakeFetcher::new().with_payload("AAA.O", esg_payload(80)));

        let results = scraper(source, fetcher.clone()).run().await.unwrap();

        assert_eq!(results.len(), 1);
        assert!(results.contains_key(&key(1, "AAA.O")));
        assert_eq!(fetcher.calls("BAD.X"), 1);
    }

    #[tokio::test]
    async fn test_empty_ticker_list() {
        let source = Arc::new(FakeSource::with_tickers(Vec::new()));
        let fetcher = Arc::new(FakeFetcher::new());

        let results = scraper(source, fetcher.clone()).run().await.unwrap();

        assert!(results.is_empty());
        assert_eq!(fetcher.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_ticker_failure_is_fatal() {
        let source = Arc::new(FakeSource::failing());
        let fetcher = Arc::new(FakeFetcher::new().with_payload("AAA.O", esg_payload(80)));

        let err = scraper(source.clone(), fetcher.clone())
            .run()
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("connection refused"));
        assert_eq!(source.calls(), 1);
        assert_eq!(fetcher.total_calls(), 0);
    }
}
