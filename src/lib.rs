pub mod db;
pub mod entity;
pub mod environment;
pub mod logging;
pub mod lseg;
pub mod pool;
pub mod scraper;
pub mod source;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_utils;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_WORKER: &str = "worker";
pub const TARGET_DB: &str = "db_query";

/// Names one worker in the pool by its outer (process) and inner (thread) slot.
#[derive(Clone, Debug)]
pub struct WorkerDetail {
    pub name: String,
}

impl WorkerDetail {
    pub fn new(process: usize, thread: usize) -> Self {
        WorkerDetail {
            name: format!("Proc-{}-T{}", process, thread),
        }
    }
}
