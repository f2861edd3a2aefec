// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory query execution.
//!
//! The two passes a search needs, over one slice of entities:
//!
//! ```text
//! count pass: filter ─────────────────────────────→ total
//! page pass:  filter → sort (keys, id ASC) → skip/take → page
//! ```
//!
//! Stores call both passes on the same snapshot so the page and the total
//! always agree.

use serde::{Deserialize, Serialize};

use crate::entity::Searchable;

use super::query_builder::Query;
use super::sort::SortSpec;

/// Offset/limit slice of an ordered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u64,
}

impl PageWindow {
    /// Window for a zero-based page of the given size.
    pub fn for_page(page_number: u64, page_size: u64) -> Self {
        Self {
            offset: page_number.saturating_mul(page_size),
            limit: page_size,
        }
    }

    fn offset_usize(&self) -> usize {
        usize::try_from(self.offset).unwrap_or(usize::MAX)
    }

    fn limit_usize(&self) -> usize {
        usize::try_from(self.limit).unwrap_or(usize::MAX)
    }
}

/// Count pass: number of entities satisfying the predicate.
pub fn count_matching<'a, E, I>(entities: I, predicate: &Query) -> u64
where
    E: Searchable,
    I: IntoIterator<Item = &'a E>,
{
    entities.into_iter().filter(|e| predicate.matches(*e)).count() as u64
}

/// Page pass: filter, order with the id tie-break, then slice.
///
/// A window past the end yields an empty page.
pub fn select_page<'a, E, I>(entities: I, predicate: &Query, sort: &SortSpec, window: PageWindow) -> Vec<E>
where
    E: Searchable,
    I: IntoIterator<Item = &'a E>,
{
    let mut survivors: Vec<&E> = entities.into_iter().filter(|e| predicate.matches(*e)).collect();
    if window.offset_usize() >= survivors.len() || window.limit == 0 {
        return Vec::new();
    }
    survivors.sort_unstable_by(|a, b| sort.compare(*a, *b));
    survivors
        .into_iter()
        .skip(window.offset_usize())
        .take(window.limit_usize())
        .cloned()
        .collect()
}
