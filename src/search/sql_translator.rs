//! SQL Translator
//!
//! Translates the predicate AST and a sort specification into parameterized
//! SQL over plain entity columns, so the SQL backend filters, counts and
//! orders inside the database with the same semantics as the in-memory path.
//!
//! # SQL Syntax Generated
//!
//! ```sql
//! (first_name || ' ' || last_name) = ?                         -- Exact (SQLite)
//! CAST(CONCAT(first_name, ' ', last_name) AS BINARY) = CAST(? AS BINARY)  -- Exact (MySQL)
//! product_name_fold LIKE ? ESCAPE '!'                         -- Fuzzy (SQLite)
//! CAST(product_name_fold AS BINARY) LIKE CAST(? AS BINARY) ESCAPE '!'    -- Fuzzy (MySQL)
//! price BETWEEN ? AND ?                                        -- Range
//! ORDER BY product_name_fold ASC, id ASC                       -- Sort + tie-break
//! ```
//!
//! Case-insensitive matching and ordering read the store's fold columns,
//! which hold [`fold_case`] of the original text. SQLite's own `UPPER` and
//! `LOWER` only fold ASCII, so they are used only for fields without a fold
//! column.
//!
//! A group with a NULL member concatenates to NULL in both dialects, so the
//! predicate is false for that row, the same as in memory.

use crate::entity::{fold_case, EntitySchema, FieldKind, Scalar};
use rust_decimal::prelude::ToPrimitive;

use super::query_builder::{FieldOperator, FieldQuery, Query, QueryNode, QueryValue, FIELD_SEPARATOR};
use super::sort::SortSpec;

/// Escape character used in LIKE patterns.
const LIKE_ESCAPE: char = '!';

/// SQL dialect, which decides how field groups are concatenated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    Sqlite,
    MySql,
}

impl SqlDialect {
    /// Detect the dialect from a connection string.
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("sqlite:") {
            Self::Sqlite
        } else {
            Self::MySql
        }
    }
}

/// SQL query translator bound to one table layout.
#[derive(Debug, Clone, Copy)]
pub struct SqlTranslator {
    dialect: SqlDialect,
    schema: &'static EntitySchema,
    /// Entity field name -> column name
    columns: &'static [(&'static str, &'static str)],
    /// Entity field name -> column holding its case fold
    folded: &'static [(&'static str, &'static str)],
}

/// SQL query result with parameterized placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    /// The SQL fragment (WHERE clause body, ORDER BY list, or full statement)
    pub clause: String,
    /// The parameter values in order
    pub params: Vec<SqlParam>,
}

/// SQL parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
    Real(f64),
    Null,
}

impl SqlParam {
    fn from_scalar(value: &Scalar) -> Self {
        match value {
            Scalar::Text(s) => Self::Text(s.clone()),
            Scalar::Integer(n) => Self::Integer(*n),
            Scalar::Decimal(d) => d.to_f64().map_or(Self::Null, Self::Real),
            Scalar::Timestamp(t) => Self::Integer(t.timestamp_millis()),
        }
    }
}

impl SqlTranslator {
    pub const fn new(
        dialect: SqlDialect,
        schema: &'static EntitySchema,
        columns: &'static [(&'static str, &'static str)],
        folded: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self { dialect, schema, columns, folded }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Column backing an entity field.
    pub fn column(&self, field: &str) -> Option<&'static str> {
        self.columns.iter().find(|(f, _)| *f == field).map(|(_, c)| *c)
    }

    /// Column holding the case fold of a text field, if the table has one.
    pub fn folded_column(&self, field: &str) -> Option<&'static str> {
        self.folded.iter().find(|(f, _)| *f == field).map(|(_, c)| *c)
    }

    /// Translate Query AST to a parameterized WHERE clause (without "WHERE").
    pub fn translate(&self, query: &Query) -> SqlQuery {
        let mut params = Vec::new();
        let clause = self.translate_node(&query.root, &mut params);
        SqlQuery { clause, params }
    }

    /// Translate Query AST to a WHERE clause with inline values
    ///
    /// Warning: Only use for debugging, not for actual queries (SQL injection risk)
    pub fn translate_inline(&self, query: &Query) -> String {
        let SqlQuery { clause, params } = self.translate(query);
        let mut result = clause;
        for param in params {
            let value = match param {
                SqlParam::Text(s) => format!("'{}'", s.replace('\'', "''")),
                SqlParam::Integer(n) => n.to_string(),
                SqlParam::Real(n) => n.to_string(),
                SqlParam::Null => "NULL".to_string(),
            };
            result = result.replacen('?', &value, 1);
        }
        result
    }

    /// ORDER BY list for the sort keys followed by `id ASC`.
    ///
    /// Unknown fields are skipped; callers validate sorts against the schema first.
    pub fn order_by(&self, sort: &SortSpec) -> String {
        sort.with_tie_break()
            .iter()
            .filter_map(|key| {
                let column = self.column(&key.field)?;
                let is_text = self
                    .schema
                    .field(&key.field)
                    .is_some_and(|def| def.kind == FieldKind::Text);
                let expr = match (key.ignore_case && is_text, self.folded_column(&key.field)) {
                    (true, Some(folded)) => folded.to_string(),
                    (true, None) => format!("UPPER({})", column),
                    (false, _) => column.to_string(),
                };
                Some(format!("{} {}", expr, key.direction.as_sql()))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `SELECT COUNT(*)` over the rows satisfying the predicate.
    pub fn count_statement(&self, table: &str, query: &Query) -> SqlQuery {
        let SqlQuery { clause, params } = self.translate(query);
        SqlQuery {
            clause: format!("SELECT COUNT(*) AS total FROM {} WHERE {}", table, clause),
            params,
        }
    }

    /// Ordered, windowed `SELECT` of every mapped column.
    pub fn page_statement(
        &self,
        table: &str,
        query: &Query,
        sort: &SortSpec,
        offset: u64,
        limit: u64,
    ) -> SqlQuery {
        let SqlQuery { clause, mut params } = self.translate(query);
        let columns: Vec<&str> = self.columns.iter().map(|(_, c)| *c).collect();
        params.push(SqlParam::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        params.push(SqlParam::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));
        SqlQuery {
            clause: format!(
                "SELECT {} FROM {} WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
                columns.join(", "),
                table,
                clause,
                self.order_by(sort)
            ),
            params,
        }
    }

    fn translate_node(&self, node: &QueryNode, params: &mut Vec<SqlParam>) -> String {
        match node {
            QueryNode::MatchAll => "1=1".to_string(),
            QueryNode::Field(field_query) => self.translate_field(field_query, params),
            QueryNode::And(nodes) => self.join_nodes(nodes, " AND ", "1=1", params),
            QueryNode::Or(nodes) => self.join_nodes(nodes, " OR ", "1=0", params),
            QueryNode::Not(inner) => {
                // NULL comparisons count as false before negation
                format!("NOT (COALESCE({}, 0))", self.translate_node(inner, params))
            }
        }
    }

    fn join_nodes(
        &self,
        nodes: &[QueryNode],
        separator: &str,
        empty: &str,
        params: &mut Vec<SqlParam>,
    ) -> String {
        let parts: Vec<String> = nodes.iter().map(|n| self.translate_node(n, params)).collect();
        match parts.len() {
            0 => empty.to_string(),
            1 => parts[0].clone(),
            _ => format!("({})", parts.join(separator)),
        }
    }

    fn translate_field(&self, field: &FieldQuery, params: &mut Vec<SqlParam>) -> String {
        let Some(target) = self.target(&field.fields) else {
            return "1=0".to_string();
        };

        match (&field.operator, &field.value) {
            (FieldOperator::Equals, QueryValue::Text(text)) => {
                params.push(SqlParam::Text(text.clone()));
                match self.dialect {
                    SqlDialect::Sqlite => format!("{} = ?", target),
                    // MySQL's default collations ignore case
                    SqlDialect::MySql => format!("CAST({} AS BINARY) = CAST(? AS BINARY)", target),
                }
            }
            (FieldOperator::ContainsIgnoreCase, QueryValue::Text(text)) => {
                match self.folded_target(&field.fields) {
                    Some(folded) => {
                        params.push(SqlParam::Text(format!("%{}%", escape_like(&fold_case(text)))));
                        match self.dialect {
                            SqlDialect::Sqlite => format!("{} LIKE ? ESCAPE '{}'", folded, LIKE_ESCAPE),
                            // Byte comparison keeps accent-insensitive collations out of it
                            SqlDialect::MySql => format!(
                                "CAST({} AS BINARY) LIKE CAST(? AS BINARY) ESCAPE '{}'",
                                folded, LIKE_ESCAPE
                            ),
                        }
                    }
                    None => {
                        // Both sides folded by the database
                        params.push(SqlParam::Text(format!("%{}%", escape_like(text))));
                        format!("UPPER({}) LIKE UPPER(?) ESCAPE '{}'", target, LIKE_ESCAPE)
                    }
                }
            }
            (FieldOperator::Range, QueryValue::Range { min, max }) => match (min, max) {
                (Some(min_val), Some(max_val)) => {
                    params.push(SqlParam::from_scalar(min_val));
                    params.push(SqlParam::from_scalar(max_val));
                    format!("{} BETWEEN ? AND ?", target)
                }
                (Some(min_val), None) => {
                    params.push(SqlParam::from_scalar(min_val));
                    format!("{} >= ?", target)
                }
                (None, Some(max_val)) => {
                    params.push(SqlParam::from_scalar(max_val));
                    format!("{} <= ?", target)
                }
                (None, None) => "1=1".to_string(), // Always true - no bounds
            },
            // Unsupported combinations never match
            _ => "1=0".to_string(),
        }
    }

    /// Column expression for a field group; `None` if any field is unmapped.
    fn target(&self, fields: &[String]) -> Option<String> {
        let columns = fields
            .iter()
            .map(|f| self.column(f))
            .collect::<Option<Vec<_>>>()?;
        self.concat(&columns)
    }

    /// Fold-column expression for a field group; `None` unless every field has one.
    fn folded_target(&self, fields: &[String]) -> Option<String> {
        let columns = fields
            .iter()
            .map(|f| self.folded_column(f))
            .collect::<Option<Vec<_>>>()?;
        self.concat(&columns)
    }

    fn concat(&self, columns: &[&str]) -> Option<String> {
        match (columns, self.dialect) {
            ([], _) => None,
            ([single], _) => Some((*single).to_string()),
            (many, SqlDialect::Sqlite) => {
                let sep = format!(" || '{}' || ", FIELD_SEPARATOR);
                Some(format!("({})", many.join(&sep)))
            }
            (many, SqlDialect::MySql) => {
                let sep = format!(", '{}', ", FIELD_SEPARATOR);
                Some(format!("CONCAT({})", many.join(&sep)))
            }
        }
    }
}

/// Escape LIKE wildcards so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}
