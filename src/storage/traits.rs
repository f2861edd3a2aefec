use async_trait::async_trait;
use thiserror::Error;

use crate::entity::Searchable;
use crate::search::{PageWindow, Query, SortSpec};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage connection error: {0}")]
    Connection(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Failed to decode row for '{entity}': {reason}")]
    Decode {
        entity: &'static str,
        reason: String,
    },
}

/// Source of entities for one searchable type.
///
/// A search opens one [`ReadSnapshot`] and runs both its count pass and its
/// page pass against it, so the total and the page see the same data.
#[async_trait]
pub trait EntityStore<E: Searchable>: Send + Sync {
    async fn begin_read(&self) -> Result<Box<dyn ReadSnapshot<E>>, StorageError>;
}

/// Consistent read view held for the duration of one search.
#[async_trait]
pub trait ReadSnapshot<E: Searchable>: Send {
    /// Number of entities satisfying the predicate.
    async fn count(&mut self, predicate: &Query) -> Result<u64, StorageError>;

    /// Entities satisfying the predicate, ordered by `sort` then ascending id,
    /// restricted to `window`.
    async fn page(
        &mut self,
        predicate: &Query,
        sort: &SortSpec,
        window: PageWindow,
    ) -> Result<Vec<E>, StorageError>;

    /// Release the snapshot. Dropping it without calling this is also safe.
    async fn finish(self: Box<Self>) -> Result<(), StorageError> {
        Ok(())
    }
}
