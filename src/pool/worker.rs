use std::sync::Arc;
use tracing::{debug, warn};

use super::queue::TaskQueue;
use super::store::ResultStore;
use crate::entity::FetchedEntity;
use crate::source::ScoreFetcher;
use crate::{WorkerDetail, TARGET_WORKER};

/// Everything a worker shares with the rest of the pool.
#[derive(Clone)]
pub struct WorkerContext {
    pub queue: Arc<TaskQueue>,
    pub store: Arc<ResultStore>,
    pub fetcher: Arc<dyn ScoreFetcher>,
    /// Descriptor field passed to the fetcher as the lookup code.
    pub lookup_field: Arc<str>,
}

/// Counts of what one worker did before it saw an empty queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub popped: usize,
    pub fetched: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Drains the shared queue until it is empty.
///
/// A failed fetch is logged and dropped; the task is not re-queued and the loop carries on.
pub async fn worker_loop(worker_detail: WorkerDetail, context: WorkerContext) -> WorkerReport {
    let mut report = WorkerReport::default();
    debug!(target: TARGET_WORKER, "[{}]: started.", worker_detail.name);

    while let Some(task) = context.queue.pop_or_empty() {
        report.popped += 1;

        let key = task.key();
        if context.store.contains(&key) {
            debug!(target: TARGET_WORKER, "[{}]: skipping duplicate entity {}.", worker_detail.name, key);
            report.skipped += 1;
            continue;
        }

        let Some(code) = task.field(&context.lookup_field) else {
            warn!(target: TARGET_WORKER, "[{}]: entity {} has no {} field.", worker_detail.name, key, context.lookup_field);
            report.failed += 1;
            continue;
        };

        debug!(target: TARGET_WORKER, "[{}]: fetching ESG scores for {}.", worker_detail.name, code);
        match context.fetcher.fetch_scores(&code).await {
            Ok(payload) => {
                context.store.insert(
                    key,
                    FetchedEntity {
                        descriptor: task,
                        payload,
                    },
                );
                report.fetched += 1;
                debug!(target: TARGET_WORKER, "[{}]: fetched data for {}.", worker_detail.name, code);
            }
            Err(err) => {
                warn!(target: TARGET_WORKER, "[{}]: unable to fetch data for {}: {:#}", worker_detail.name, code, err);
                report.failed += 1;
            }
        }
    }

    debug!(target: TARGET_WORKER, "[{}]: no more tasks.", worker_detail.name);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{entity, key, FakeFetcher};
    use serde_json::json;

    fn context(tasks: Vec<crate::pool::Task>, fetcher: Arc<FakeFetcher>) -> WorkerContext {
        WorkerContext {
            queue: Arc::new(TaskQueue::new(tasks)),
            store: Arc::new(ResultStore::new()),
            fetcher,
            lookup_field: Arc::from("code"),
        }
    }

    #[tokio::test]
    async fn test_single_worker_drains_queue() {
        let fetcher = Arc::new(FakeFetcher::new().with_payload("AAA.O", json!({"esgScore": {}})));
        let context = context(
            vec![entity(1, "AAA.O"), entity(1, "AAA.O"), entity(2, "BAD.X")],
            fetcher.clone(),
        );

        let report = worker_loop(WorkerDetail::new(0, 0), context.clone()).await;

        assert_eq!(
            report,
            WorkerReport {
                popped: 3,
                fetched: 1,
                skipped: 1,
                failed: 1,
            }
        );
        assert!(context.queue.is_empty());
        assert!(context.store.contains(&key(1, "AAA.O")));
        assert!(!context.store.contains(&key(2, "BAD.X")));
        assert_eq!(fetcher.calls("AAA.O"), 1);
        assert_eq!(fetcher.calls("BAD.X"), 1);
    }

    #[tokio::test]
    async fn test_missing_lookup_field_is_an_isolated_failure() {
        let fetcher = Arc::new(FakeFetcher::new().with_payload("AAA.O", json!({})));
        let orphan = crate::entity::EntityDescriptor::try_from(json!({"id": 9})).unwrap();
        let context = context(vec![orphan, entity(1, "AAA.O")], fetcher.clone());

        let report = worker_loop(WorkerDetail::new(0, 0), context.clone()).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.fetched, 1);
        assert_eq!(context.store.len(), 1);
        assert_eq!(fetcher.total_calls(), 1);
    }
}
