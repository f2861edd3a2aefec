// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Sort specification and deterministic ordering.
//!
//! Every ordering ends with `id ASC`, so rows that tie on the requested keys
//! keep the same relative order across repeated queries and page boundaries.
//!
//! # Query-string form
//!
//! ```text
//! price               -> price ASC
//! closes,desc         -> closes DESC
//! productName,asc,ignorecase
//! ```
//!
//! ```
//! use marketplace_search::search::{SortDirection, SortSpec};
//!
//! let sort = SortSpec::parse_all(&["price,desc", "productName,ignorecase"]).unwrap();
//! assert_eq!(sort.fields()[0].direction, SortDirection::Desc);
//! assert!(sort.fields()[1].ignore_case);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::{EntitySchema, Searchable, ID_FIELD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SortError {
    #[error("sort parameter '{0}' has no field name")]
    MissingField(String),
    #[error("invalid sort direction '{0}'")]
    InvalidDirection(String),
    #[error("unknown sort field '{0}'")]
    UnknownField(String),
    #[error("field '{0}' cannot be sorted on")]
    UnsortableField(String),
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortField {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
    #[serde(default)]
    pub ignore_case: bool,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
            ignore_case: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
            ignore_case: false,
        }
    }

    pub fn ignoring_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    fn compare<E: Searchable>(&self, a: &E, b: &E) -> Ordering {
        let ord = match (a.field(&self.field), b.field(&self.field)) {
            (Some(x), Some(y)) => x.compare(&y, self.ignore_case),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

impl FromStr for SortField {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        let field = parts
            .next()
            .filter(|f| !f.is_empty())
            .ok_or_else(|| SortError::MissingField(s.to_string()))?;
        let mut sort = SortField::asc(field);

        for part in parts.filter(|p| !p.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                "asc" => sort.direction = SortDirection::Asc,
                "desc" => sort.direction = SortDirection::Desc,
                "ignorecase" => sort.ignore_case = true,
                _ => return Err(SortError::InvalidDirection(part.to_string())),
            }
        }
        Ok(sort)
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.field, self.direction.as_sql().to_ascii_lowercase())?;
        if self.ignore_case {
            f.write_str(",ignorecase")?;
        }
        Ok(())
    }
}

/// Ordered list of sort keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    fields: Vec<SortField>,
}

impl SortSpec {
    /// No requested keys; rows come back in identifier order.
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn new(fields: Vec<SortField>) -> Self {
        Self { fields }
    }

    pub fn then(mut self, field: SortField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Result<Self, SortError> {
        raw.iter()
            .map(|s| s.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check every key names a sortable field of the entity.
    pub fn validate(&self, schema: &EntitySchema) -> Result<(), SortError> {
        for sort in &self.fields {
            match schema.field(&sort.field) {
                None => return Err(SortError::UnknownField(sort.field.clone())),
                Some(def) if !def.sortable => {
                    return Err(SortError::UnsortableField(sort.field.clone()))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Requested keys followed by the `id ASC` tie-break.
    pub fn with_tie_break(&self) -> Vec<SortField> {
        let mut keys = self.fields.clone();
        keys.push(SortField::asc(ID_FIELD));
        keys
    }

    /// Total order over entities: requested keys, then ascending id.
    pub fn compare<E: Searchable>(&self, a: &E, b: &E) -> Ordering {
        self.fields
            .iter()
            .map(|key| key.compare(a, b))
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| a.id().cmp(&b.id()))
    }
}
