//! Two-tier worker pool that drains a shared [`TaskQueue`] into a shared [`ResultStore`].
//!
//! The outer tier is one tokio task per "process" slot, scheduled across the runtime's OS
//! threads; each owns a `JoinSet` of inner workers. Every worker runs [`worker_loop`] against
//! the same queue and store. [`WorkerPool::run`] returns only after every inner set has been
//! joined and every outer task has finished.

mod queue;
mod store;
mod worker;


pub use queue::{Task, TaskQueue};
pub use store::ResultStore;
pub use worker::{worker_loop, WorkerContext, WorkerReport};

use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

use crate::{WorkerDetail, TARGET_WORKER};

pub const DEFAULT_THREAD_COUNT: usize = 8;

/// How many outer units to start and how many workers each of them runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLayout {
    processes: usize,
    threads: usize,
}

impl PoolLayout {
    /// Both counts are clamped to at least one.
    pub fn new(processes: usize, threads: usize) -> Self {
        PoolLayout {
            processes: processes.max(1),
            threads: threads.max(1),
        }
    }

    /// One outer unit per available CPU.
    pub fn per_cpu(threads: usize) -> Self {
        PoolLayout::new(available_cpus(), threads)
    }

    pub fn processes(&self) -> usize {
        self.processes
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn worker_count(&self) -> usize {
        self.processes * self.threads
    }
}

impl Default for PoolLayout {
    fn default() -> Self {
        PoolLayout::per_cpu(DEFAULT_THREAD_COUNT)
    }
}

pub fn available_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Totals across every worker once the pool barrier has been passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSummary {
    pub workers: usize,
    pub popped: usize,
    pub fetched: usize,
    pub skipped: usize,
    pub failed: usize,
    pub panicked: usize,
}

impl PoolSummary {
    fn record(&mut self, report: WorkerReport) {
        self.workers += 1;
        self.popped += report.popped;
        self.fetched += report.fetched;
        self.skipped += report.skipped;
        self.failed += report.failed;
    }

    fn merge(&mut self, other: PoolSummary) {
        self.workers += other.workers;
        self.popped += other.popped;
        self.fetched += other.fetched;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.panicked += other.panicked;
    }
}

pub struct WorkerPool {
    layout: PoolLayout,
    context: WorkerContext,
}

impl WorkerPool {
    pub fn new(layout: PoolLayout, context: WorkerContext) -> Self {
        WorkerPool { layout, context }
    }

    /// Starts every worker and waits for all of them to observe an empty queue.
    pub async fn run(self) -> PoolSummary {
        info!(
            target: TARGET_WORKER,
            "Starting {} processes x {} threads each",
            self.layout.processes(),
            self.layout.threads()
        );

        let processes: Vec<(String, JoinHandle<PoolSummary>)> = (0..self.layout.processes())
            .map(|process| {
                let context = self.context.clone();
                let threads = self.layout.threads();
                let handle = tokio::spawn(run_process(process, threads, context));
                debug!(target: TARGET_WORKER, "Started Proc-{}", process);
                (format!("Proc-{}", process), handle)
            })
            .collect();

        let mut summary = PoolSummary::default();
        for (name, handle) in processes {
            match handle.await {
                Ok(process_summary) => {
                    summary.merge(process_summary);
                    debug!(target: TARGET_WORKER, "{} has finished", name);
                }
                Err(err) => {
                    error!(target: TARGET_WORKER, "{} terminated abnormally: {}", name, err);
                    summary.panicked += self.layout.threads();
                }
            }
        }

        summary
    }
}

/// One outer unit: spawns its inner workers and joins all of them.
async fn run_process(process: usize, threads: usize, context: WorkerContext) -> PoolSummary {
    let mut workers = JoinSet::new();
    for thread in 0..threads {
        workers.spawn(worker_loop(WorkerDetail::new(process, thread), context.clone()));
    }

    let mut summary = PoolSummary::default();
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(report) => summary.record(report),
            Err(err) => {
                error!(target: TARGET_WORKER, "Worker in Proc-{} terminated abnormally: {}", process, err);
                summary.panicked += 1;
            }
        }
    }

    summary
}
