use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::traits::{EntityStore, ReadSnapshot, StorageError};
use crate::entity::Searchable;
use crate::search::{count_matching, select_page, PageWindow, Query, SortSpec};

/// Copy-on-write in-memory entity store.
///
/// Readers clone the current `Arc` and keep a frozen view; writers replace
/// the map contents through `Arc::make_mut`, so a write never disturbs a
/// search already in progress.
pub struct InMemoryStore<E> {
    data: RwLock<Arc<BTreeMap<i64, E>>>,
}

impl<E: Searchable> InMemoryStore<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: RwLock::new(Arc::new(BTreeMap::new())),
        }
    }

    /// Build a store pre-populated with entities (later ids overwrite earlier).
    pub fn from_entities(entities: impl IntoIterator<Item = E>) -> Self {
        let map = entities.into_iter().map(|e| (e.id(), e)).collect();
        Self {
            data: RwLock::new(Arc::new(map)),
        }
    }

    /// Insert or replace by id, returning the previous entity.
    pub fn insert(&self, entity: E) -> Option<E> {
        let mut guard = self.data.write();
        Arc::make_mut(&mut guard).insert(entity.id(), entity)
    }

    pub fn remove(&self, id: i64) -> Option<E> {
        let mut guard = self.data.write();
        Arc::make_mut(&mut guard).remove(&id)
    }

    pub fn get(&self, id: i64) -> Option<E> {
        self.data.read().get(&id).cloned()
    }

    /// Get current entity count
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Clear all entities
    pub fn clear(&self) {
        *self.data.write() = Arc::new(BTreeMap::new());
    }

    fn snapshot(&self) -> Arc<BTreeMap<i64, E>> {
        Arc::clone(&self.data.read())
    }
}

impl<E: Searchable> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

struct MemorySnapshot<E> {
    data: Arc<BTreeMap<i64, E>>,
}

#[async_trait]
impl<E: Searchable> ReadSnapshot<E> for MemorySnapshot<E> {
    async fn count(&mut self, predicate: &Query) -> Result<u64, StorageError> {
        Ok(count_matching(self.data.values(), predicate))
    }

    async fn page(
        &mut self,
        predicate: &Query,
        sort: &SortSpec,
        window: PageWindow,
    ) -> Result<Vec<E>, StorageError> {
        Ok(select_page(self.data.values(), predicate, sort, window))
    }
}

#[async_trait]
impl<E: Searchable> EntityStore<E> for InMemoryStore<E> {
    async fn begin_read(&self) -> Result<Box<dyn ReadSnapshot<E>>, StorageError> {
        Ok(Box::new(MemorySnapshot {
            data: self.snapshot(),
        }))
    }
}
