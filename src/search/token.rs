// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search token parsing.
//!
//! A quoted phrase (`"Alice Smith"`) becomes an [`SearchToken::Exact`] token;
//! anything else becomes a [`SearchToken::Fuzzy`] token.
//!
//! ```
//! use marketplace_search::search::{parse_tokens, SearchToken};
//!
//! let tokens = parse_tokens(&["\"Alice\"", "  bob "]);
//! assert_eq!(tokens, vec![
//!     SearchToken::Exact("Alice".into()),
//!     SearchToken::Fuzzy("bob".into()),
//! ]);
//! ```

use serde::{Deserialize, Serialize};

const QUOTE: char = '"';

/// One parsed search phrase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text")]
pub enum SearchToken {
    /// Quoted phrase: case-sensitive equality
    Exact(String),
    /// Bare phrase: case-insensitive containment
    Fuzzy(String),
}

impl SearchToken {
    /// Parse one raw phrase. Returns `None` when nothing searchable remains.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.len() >= 2 && trimmed.starts_with(QUOTE) && trimmed.ends_with(QUOTE) {
            let inner = trimmed.trim_matches(QUOTE);
            if inner.trim().is_empty() {
                return None;
            }
            return Some(Self::Exact(inner.to_string()));
        }
        if trimmed.is_empty() {
            None
        } else {
            Some(Self::Fuzzy(trimmed.to_string()))
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Exact(t) | Self::Fuzzy(t) => t,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact(_))
    }
}

/// Parse raw phrases, dropping any that are blank.
pub fn parse_tokens<S: AsRef<str>>(raw: &[S]) -> Vec<SearchToken> {
    raw.iter()
        .filter_map(|s| SearchToken::parse(s.as_ref()))
        .collect()
}
