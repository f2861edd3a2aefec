// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Entity stores.
//!
//! - [`memory::InMemoryStore`]: copy-on-write map, snapshots are `Arc` clones
//! - [`sql::SqlStore`]: MySQL/SQLite, snapshots are read transactions

pub mod traits;
pub mod memory;
pub mod sql;
