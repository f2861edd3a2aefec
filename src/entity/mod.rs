// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Searchable entity model.
//!
//! The search core never owns entities. It reads them through the
//! [`Searchable`] trait: a stable identifier, a static [`EntitySchema`]
//! describing which fields exist (and which may be sorted on), and a
//! by-name field accessor returning borrowed [`FieldValue`]s.
//!
//! # Example
//!
//! ```
//! use marketplace_search::entity::{FieldValue, Searchable, User};
//!
//! let user = User::new(7, "Alice", "Smith").with_nickname("ally");
//!
//! assert_eq!(user.id(), 7);
//! assert_eq!(user.field("firstName"), Some(FieldValue::Text("Alice")));
//! assert_eq!(user.field("middleName"), None);
//! assert!(User::schema().field("lastName").is_some());
//! ```

mod listing;
mod user;

pub use listing::{BusinessType, Listing, Location, ParseBusinessTypeError};
pub use user::User;

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Name of the identifier field every entity exposes.
pub const ID_FIELD: &str = "id";

/// Case fold shared by case-insensitive matching and ordering.
///
/// Full Unicode upper-casing, so `"kūmara"` and `"KŪMARA"` fold alike. The SQL
/// store writes this fold into its search columns, so both stores agree.
pub fn fold_case(text: &str) -> String {
    text.to_uppercase()
}

/// Borrowed view of a single field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Integer(i64),
    Decimal(Decimal),
    Timestamp(DateTime<Utc>),
}

impl<'a> FieldValue<'a> {
    /// Text content, if this is a text value.
    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            Self::Text(s) => Some(*s),
            _ => None,
        }
    }

    /// Natural ordering between two values of the same field.
    ///
    /// `ignore_case` only affects text. Values of different kinds never occur
    /// for the same field; they are ordered by kind so the comparison stays total.
    pub fn compare(&self, other: &FieldValue<'_>, ignore_case: bool) -> Ordering {
        match (self, other) {
            (Self::Text(a), FieldValue::Text(b)) => {
                if ignore_case {
                    fold_case(a).cmp(&fold_case(b))
                } else {
                    a.cmp(b)
                }
            }
            (Self::Integer(a), FieldValue::Integer(b)) => a.cmp(b),
            (Self::Decimal(a), FieldValue::Decimal(b)) => a.cmp(b),
            (Self::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Self::Text(_) => 0,
            Self::Integer(_) => 1,
            Self::Decimal(_) => 2,
            Self::Timestamp(_) => 3,
        }
    }
}

/// Owned scalar used as a predicate operand (equality targets, range bounds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Timestamp(DateTime<Utc>),
}

impl Scalar {
    /// Borrow as a [`FieldValue`].
    pub fn as_field(&self) -> FieldValue<'_> {
        match self {
            Self::Text(s) => FieldValue::Text(s),
            Self::Integer(n) => FieldValue::Integer(*n),
            Self::Decimal(d) => FieldValue::Decimal(*d),
            Self::Timestamp(t) => FieldValue::Timestamp(*t),
        }
    }

    /// Compare a field value against this scalar.
    ///
    /// Returns `None` when the kinds differ, which predicates treat as "no match".
    pub fn cmp_field(&self, value: &FieldValue<'_>) -> Option<Ordering> {
        match (value, self) {
            (FieldValue::Text(a), Self::Text(b)) => Some(a.cmp(&b.as_str())),
            (FieldValue::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Decimal(a), Self::Decimal(b)) => Some(a.cmp(b)),
            (FieldValue::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Kind of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    Timestamp,
}

/// Static description of one entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub sortable: bool,
}

impl FieldDef {
    pub const fn sortable(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, sortable: true }
    }

    pub const fn unsortable(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, sortable: false }
    }
}

/// Static field catalogue for one entity type.
#[derive(Debug)]
pub struct EntitySchema {
    /// Entity name used in logs and metrics (e.g. "user")
    pub entity: &'static str,
    pub fields: &'static [FieldDef],
}

impl EntitySchema {
    /// Look up a field by its external name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Which entity fields the structured filters apply to.
///
/// `None` means the entity has no such facet and the filter cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterFields {
    pub business_type: Option<&'static str>,
    pub price: Option<&'static str>,
    pub date: Option<&'static str>,
}

impl FilterFields {
    pub const NONE: Self = Self {
        business_type: None,
        price: None,
        date: None,
    };
}

/// Read access the search core needs from an entity.
pub trait Searchable: Clone + Send + Sync + 'static {
    /// Field catalogue shared by every instance.
    fn schema() -> &'static EntitySchema;

    /// Filter facets supported by this entity type.
    fn filter_fields() -> FilterFields {
        FilterFields::NONE
    }

    /// Unique identifier, used as the final sort tie-break.
    fn id(&self) -> i64;

    /// Value of the named field; `None` when the field is absent or unknown.
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}
