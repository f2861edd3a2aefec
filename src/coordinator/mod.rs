// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search coordinator.
//!
//! A [`Searcher`] binds one entity store to one [`SearchTarget`] and runs
//! validated, paginated searches against it:
//!
//! ```text
//! validate (page, sort, filters) ─→ build predicate ─→ begin_read
//!                                                        │
//!                                            count pass ─┤
//!                                             page pass ─┤
//!                                                        ▼
//!                                                   PageResult
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use marketplace_search::{
//!     FilterSpec, InMemoryStore, PageRequest, SearchConfig, Searcher, SortSpec, User,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = Arc::new(InMemoryStore::from_entities([
//!     User::new(1, "Alice", "Smith"),
//!     User::new(2, "Bob", "Jones"),
//! ]));
//! let searcher = Searcher::users_by_name(store, SearchConfig::default());
//!
//! let page = searcher
//!     .search(&["ali"], &FilterSpec::new(), &SortSpec::unsorted(), PageRequest::new(0, 10, 48).unwrap())
//!     .await
//!     .unwrap();
//! assert_eq!(page.total_elements, 1);
//! assert_eq!(page.content[0].first_name, "Alice");
//! # }
//! ```

mod types;
mod search_api;

pub use types::SearchError;

use std::sync::Arc;

use crate::config::SearchConfig;
use crate::entity::{Listing, Searchable, User};
use crate::search::SearchTarget;
use crate::storage::traits::EntityStore;

/// Paginated, filtered search over one entity store.
pub struct Searcher<E: Searchable> {
    store: Arc<dyn EntityStore<E>>,
    target: SearchTarget,
    config: SearchConfig,
}

impl<E: Searchable> Searcher<E> {
    fn new(store: Arc<dyn EntityStore<E>>, target: SearchTarget, config: SearchConfig) -> Self {
        Self { store, target, config }
    }

    pub fn target(&self) -> SearchTarget {
        self.target
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

impl Searcher<User> {
    /// Users by nickname and name combinations.
    pub fn users_by_name(store: Arc<dyn EntityStore<User>>, config: SearchConfig) -> Self {
        Self::new(store, SearchTarget::UserName, config)
    }
}

impl Searcher<Listing> {
    pub fn listings_by_product_name(store: Arc<dyn EntityStore<Listing>>, config: SearchConfig) -> Self {
        Self::new(store, SearchTarget::ListingProductName, config)
    }

    pub fn listings_by_business_name(store: Arc<dyn EntityStore<Listing>>, config: SearchConfig) -> Self {
        Self::new(store, SearchTarget::ListingBusinessName, config)
    }

    /// Listings by suburb, region, city or country.
    pub fn listings_by_location(store: Arc<dyn EntityStore<Listing>>, config: SearchConfig) -> Self {
        Self::new(store, SearchTarget::ListingLocation, config)
    }
}

impl<E: Searchable> Clone for Searcher<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            target: self.target,
            config: self.config.clone(),
        }
    }
}
