use dashmap::DashMap;

use crate::entity::{EntityKey, FetchedEntity, ScrapeResults};

/// Fetched entities keyed by identity, shared by every worker in the pool.
///
/// `contains` and `insert` are individually atomic but not a single transaction, so two
/// workers holding the same key can both fetch it. The later insert wins.
#[derive(Debug, Default)]
pub struct ResultStore {
    entries: DashMap<EntityKey, FetchedEntity>,
}

impl ResultStore {
    pub fn new() -> Self {
        ResultStore::default()
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&self, key: EntityKey, entity: FetchedEntity) {
        self.entries.insert(key, entity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies the current contents out without consuming the store.
    pub fn snapshot(&self) -> ScrapeResults {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn into_results(self) -> ScrapeResults {
        self.entries.into_iter().collect()
    }
}
