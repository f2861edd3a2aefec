// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Builder - predicate AST for entity searches
//!
//! Provides a type-safe way to build search predicates that can be evaluated
//! in memory against any [`Searchable`] entity, or translated to SQL by
//! [`SqlTranslator`](super::SqlTranslator).
//!
//! # Example
//!
//! ```rust
//! use marketplace_search::entity::{Scalar, User};
//! use marketplace_search::search::{Query, QueryBuilder};
//!
//! // Case-insensitive containment over "firstName lastName"
//! let query = Query::contains(&["firstName", "lastName"], "ice smi");
//! assert!(query.matches(&User::new(1, "Alice", "Smith")));
//!
//! // OR of several predicates
//! let query = QueryBuilder::new()
//!     .exact(&["nickname"], "ally")
//!     .contains(&["lastName"], "smith")
//!     .build_or();
//! assert!(query.matches(&User::new(2, "Bob", "Smithers")));
//!
//! // An empty builder matches everything
//! assert!(QueryBuilder::new().build_or().matches(&User::new(3, "Carol", "Jones")));
//! ```

use std::borrow::Cow;
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::entity::{fold_case, FieldValue, Scalar, Searchable};

/// Separator placed between the fields of a concatenated target.
pub const FIELD_SEPARATOR: &str = " ";

/// Search predicate AST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Root query node
    pub root: QueryNode,
}

impl Query {
    /// Create a new query from a root node
    pub fn new(root: QueryNode) -> Self {
        Self { root }
    }

    /// Predicate that is true for every entity
    pub fn match_all() -> Self {
        Self::new(QueryNode::MatchAll)
    }

    /// Case-sensitive equality against the space-joined fields
    pub fn exact(fields: &[&str], text: impl Into<String>) -> Self {
        Self::new(QueryNode::Field(FieldQuery::new(
            fields,
            FieldOperator::Equals,
            QueryValue::Text(text.into()),
        )))
    }

    /// Case-insensitive containment within the space-joined fields
    pub fn contains(fields: &[&str], text: impl Into<String>) -> Self {
        Self::new(QueryNode::Field(FieldQuery::new(
            fields,
            FieldOperator::ContainsIgnoreCase,
            QueryValue::Text(text.into()),
        )))
    }

    /// Equality on a single text field
    pub fn field_eq(field: &str, text: impl Into<String>) -> Self {
        Self::exact(&[field], text)
    }

    /// Inclusive range on a single field; a missing bound is unbounded
    pub fn range(field: &str, min: Option<Scalar>, max: Option<Scalar>) -> Self {
        Self::new(QueryNode::Field(FieldQuery::new(
            &[field],
            FieldOperator::Range,
            QueryValue::Range { min, max },
        )))
    }

    /// Combine with AND
    pub fn and(self, other: Query) -> Self {
        Self::new(QueryNode::And(vec![self.root, other.root]))
    }

    /// Combine with OR
    pub fn or(self, other: Query) -> Self {
        Self::new(QueryNode::Or(vec![self.root, other.root]))
    }

    /// Negate query
    pub fn negate(self) -> Self {
        Self::new(QueryNode::Not(Box::new(self.root)))
    }

    /// Evaluate against one entity
    pub fn matches<E: Searchable>(&self, entity: &E) -> bool {
        self.root.matches(entity)
    }
}

/// Query AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryNode {
    /// Unconditionally true
    MatchAll,
    /// Field predicate
    Field(FieldQuery),
    /// Boolean AND (empty = true)
    And(Vec<QueryNode>),
    /// Boolean OR (empty = false)
    Or(Vec<QueryNode>),
    /// Boolean NOT
    Not(Box<QueryNode>),
}

impl QueryNode {
    pub fn matches<E: Searchable>(&self, entity: &E) -> bool {
        match self {
            Self::MatchAll => true,
            Self::Field(field_query) => field_query.matches(entity),
            Self::And(nodes) => nodes.iter().all(|n| n.matches(entity)),
            Self::Or(nodes) => nodes.iter().any(|n| n.matches(entity)),
            Self::Not(inner) => !inner.matches(entity),
        }
    }
}

/// Field predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldQuery {
    /// Target fields; more than one are joined with [`FIELD_SEPARATOR`]
    pub fields: Vec<String>,
    /// Comparison operator
    pub operator: FieldOperator,
    /// Query value
    pub value: QueryValue,
}

impl FieldQuery {
    pub fn new(fields: &[&str], operator: FieldOperator, value: QueryValue) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            operator,
            value,
        }
    }

    fn matches<E: Searchable>(&self, entity: &E) -> bool {
        match (&self.operator, &self.value) {
            (FieldOperator::Equals, QueryValue::Text(text)) => {
                target_text(&self.fields, entity).is_some_and(|value| value == text.as_str())
            }
            (FieldOperator::ContainsIgnoreCase, QueryValue::Text(text)) => {
                target_text(&self.fields, entity)
                    .is_some_and(|value| fold_case(&value).contains(&fold_case(text)))
            }
            (FieldOperator::Range, QueryValue::Range { min, max }) => {
                let [field] = self.fields.as_slice() else {
                    return false;
                };
                let Some(value) = entity.field(field) else {
                    return false;
                };
                within(&value, min.as_ref(), max.as_ref())
            }
            // Unsupported combinations never match
            _ => false,
        }
    }
}

/// Field comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldOperator {
    /// Exact, case-sensitive equality
    Equals,
    /// Upper-cased substring containment
    ContainsIgnoreCase,
    /// Inclusive bounds
    Range,
}

/// Query value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryValue {
    /// Text value
    Text(String),
    /// Inclusive range [min, max]
    Range {
        min: Option<Scalar>,
        max: Option<Scalar>,
    },
}

/// Resolve the comparison string for a field target.
///
/// Any absent or non-text field yields `None`, as a SQL concatenation
/// involving NULL would.
fn target_text<'a, E: Searchable>(fields: &[String], entity: &'a E) -> Option<Cow<'a, str>> {
    match fields {
        [] => None,
        [single] => entity.field(single)?.as_text().map(Cow::Borrowed),
        many => {
            let parts = many
                .iter()
                .map(|f| entity.field(f).and_then(|v| v.as_text()))
                .collect::<Option<Vec<&str>>>()?;
            Some(Cow::Owned(parts.join(FIELD_SEPARATOR)))
        }
    }
}

fn within(value: &FieldValue<'_>, min: Option<&Scalar>, max: Option<&Scalar>) -> bool {
    if let Some(min) = min {
        match min.cmp_field(value) {
            Some(Ordering::Greater | Ordering::Equal) => {}
            _ => return false,
        }
    }
    if let Some(max) = max {
        match max.cmp_field(value) {
            Some(Ordering::Less | Ordering::Equal) => {}
            _ => return false,
        }
    }
    true
}

/// Builder for flat AND / OR predicates
#[derive(Default)]
pub struct QueryBuilder {
    nodes: Vec<QueryNode>,
}

impl QueryBuilder {
    /// Create a new query builder
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Number of predicates collected so far
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a prebuilt query
    pub fn push(mut self, query: Query) -> Self {
        self.nodes.push(query.root);
        self
    }

    /// Add an exact-match constraint over joined fields
    pub fn exact(self, fields: &[&str], text: impl Into<String>) -> Self {
        self.push(Query::exact(fields, text))
    }

    /// Add a containment constraint over joined fields
    pub fn contains(self, fields: &[&str], text: impl Into<String>) -> Self {
        self.push(Query::contains(fields, text))
    }

    /// Add a single-field equality constraint
    pub fn field_eq(self, field: &str, text: impl Into<String>) -> Self {
        self.push(Query::field_eq(field, text))
    }

    /// Add an inclusive range constraint
    pub fn range(self, field: &str, min: Option<Scalar>, max: Option<Scalar>) -> Self {
        self.push(Query::range(field, min, max))
    }

    /// Build query with AND semantics (all constraints must match)
    pub fn build_and(self) -> Query {
        Self::collapse(self.nodes, QueryNode::And)
    }

    /// Build query with OR semantics (any constraint can match)
    ///
    /// An empty builder yields a match-all query rather than an empty OR.
    pub fn build_or(self) -> Query {
        Self::collapse(self.nodes, QueryNode::Or)
    }

    fn collapse(mut nodes: Vec<QueryNode>, join: fn(Vec<QueryNode>) -> QueryNode) -> Query {
        match nodes.len() {
            0 => Query::match_all(),
            1 => Query::new(nodes.remove(0)),
            _ => Query::new(join(nodes)),
        }
    }
}
