// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search Infrastructure
//!
//! Turns raw search terms, structured filters and a sort request into a
//! predicate AST plus an ordering, evaluated in memory or translated to SQL.
//!
//! # Architecture
//!
//! ```text
//! raw terms ─→ SearchToken (exact / fuzzy)
//!                  │
//!                  ▼  × FieldGroup (per SearchTarget)
//!             match predicate (flat OR)
//!                  │
//!   FilterSpec ─→ AND ─→ Query (AST)
//!                  │
//!                  ├─→ executor (in memory: filter → sort → slice)
//!                  └─→ SqlTranslator (WHERE / ORDER BY / LIMIT OFFSET)
//! ```
//!
//! # Term syntax
//!
//! ```text
//! "Alice Smith"   - Exact: case-sensitive equality with a whole field group
//! ali             - Fuzzy: case-insensitive containment within a field group
//! ```
//!
//! ```rust
//! use marketplace_search::entity::User;
//! use marketplace_search::search::{match_predicate, parse_tokens, SearchTarget};
//!
//! let tokens = parse_tokens(&["\"Alice Smith\"", "bob"]);
//! let predicate = match_predicate(&tokens, SearchTarget::UserName.field_groups());
//!
//! assert!(predicate.matches(&User::new(1, "Alice", "Smith")));
//! assert!(predicate.matches(&User::new(2, "Bobby", "Jones")));
//! assert!(!predicate.matches(&User::new(3, "alice", "smith")));
//! ```

mod token;
mod field_group;
mod query_builder;
mod matcher;
mod filter;
mod sort;
mod executor;
mod sql_translator;

pub use token::{parse_tokens, SearchToken};
pub use field_group::{
    FieldGroup, SearchTarget, LISTING_BUSINESS_GROUPS, LISTING_LOCATION_GROUPS,
    LISTING_PRODUCT_GROUPS, USER_NAME_GROUPS,
};
pub use query_builder::{
    FieldOperator, FieldQuery, Query, QueryBuilder, QueryNode, QueryValue, FIELD_SEPARATOR,
};
pub use matcher::{match_predicate, token_predicate};
pub use filter::{combine, FilterFacet, FilterSpec};
pub use sort::{SortDirection, SortError, SortField, SortSpec};
pub use executor::{count_matching, select_page, PageWindow};
pub use sql_translator::{SqlDialect, SqlParam, SqlQuery, SqlTranslator};
