//! In-memory stand-ins for the remote provider.

use anyhow::{anyhow, Result};
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::entity::{EntityDescriptor, EntityKey, Payload};
use crate::source::{ScoreFetcher, TickerSource};

/// Descriptor shaped like `{id, code}`.
pub fn entity(id: i64, code: &str) -> EntityDescriptor {
    EntityDescriptor::try_from(json!({"id": id, "code": code})).unwrap()
}

/// Identity key of `entity(id, code)`.
pub fn key(id: i64, code: &str) -> EntityKey {
    entity(id, code).key()
}

pub fn esg_payload(score: i64) -> Value {
    json!({"esgScore": {"TR.TRESGScore": {"score": score, "weight": 1}}})
}

/// Answers from a fixed table and counts calls per code. Unknown codes fail.
#[derive(Default)]
pub struct FakeFetcher {
    payloads: HashMap<String, Payload>,
    calls: DashMap<String, usize>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        FakeFetcher::default()
    }

    pub fn with_payload(mut self, code: &str, payload: Payload) -> Self {
        self.payloads.insert(code.to_string(), payload);
        self
    }

    pub fn calls(&self, code: &str) -> usize {
        self.calls.get(code).map(|count| *count).unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }
}

impl ScoreFetcher for FakeFetcher {
    fn fetch_scores<'a>(&'a self, code: &'a str) -> BoxFuture<'a, Result<Payload>> {
        async move {
            *self.calls.entry(code.to_string()).or_insert(0) += 1;
            // Give other workers a chance to interleave.
            tokio::task::yield_now().await;
            self.payloads
                .get(code)
                .cloned()
                .ok_or_else(|| anyhow!("404 Not Found for {}", code))
        }
        .boxed()
    }
}

pub struct FakeSource {
    tickers: Option<Vec<EntityDescriptor>>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn with_tickers(tickers: Vec<EntityDescriptor>) -> Self {
        FakeSource {
            tickers: Some(tickers),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        FakeSource {
            tickers: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TickerSource for FakeSource {
    fn fetch_tickers(&self) -> BoxFuture<'_, Result<Vec<EntityDescriptor>>> {
        async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.tickers
                .clone()
                .ok_or_else(|| anyhow!("connection refused"))
        }
        .boxed()
    }
}
