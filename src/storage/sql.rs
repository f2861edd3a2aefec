// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQL storage backend (MySQL or SQLite via the sqlx `Any` driver).
//!
//! Each entity type lives in its own table with one column per field:
//!
//! ```sql
//! CREATE TABLE users (
//!   id BIGINT PRIMARY KEY,
//!   first_name VARCHAR(255) NOT NULL,
//!   middle_name VARCHAR(255),
//!   last_name VARCHAR(255) NOT NULL,
//!   nickname VARCHAR(255),
//!   email VARCHAR(255) NOT NULL,
//!   created BIGINT NOT NULL,       -- epoch millis
//!   first_name_fold VARCHAR(768) NOT NULL,
//!   ...
//! )
//! ```
//!
//! Every searchable text column has a `_fold` twin holding its full Unicode
//! upper-case fold, written from Rust on upsert. SQLite's `UPPER` only folds
//! ASCII, so fuzzy matching and case-insensitive ordering read the twins.
//!
//! Prices are stored as DOUBLE/REAL and timestamps as epoch milliseconds, so
//! range filters and ordering run as plain numeric comparisons.
//!
//! A search reads through one transaction: `COUNT(*)` and the windowed
//! `SELECT` share its snapshot.
//!
//! ## sqlx Any Driver Quirks
//!
//! MySQL TEXT columns may come back as bytes through the `Any` driver, so text
//! columns are read as `String` first and then as UTF-8 `Vec<u8>`.

use std::marker::PhantomData;
use std::sync::Once;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sqlx::any::{AnyArguments, AnyPoolOptions, AnyRow};
use sqlx::{Any, AnyPool, Row, Transaction};
use tracing::{debug, info};

use super::traits::{EntityStore, ReadSnapshot, StorageError};
use crate::config::SearchConfig;
use crate::entity::{fold_case, BusinessType, Listing, Location, Searchable, User};
use crate::resilience::retry::{retry, RetryConfig};
use crate::search::{PageWindow, Query, SortSpec, SqlDialect, SqlParam, SqlTranslator};

// SQLx `Any` driver requires runtime installation
static INSTALL_DRIVERS: Once = Once::new();

fn install_drivers() {
    INSTALL_DRIVERS.call_once(|| {
        sqlx::any::install_default_drivers();
    });
}

/// Table mapping for an entity stored in SQL.
pub trait SqlEntity: Searchable {
    const TABLE: &'static str;

    /// Entity field name -> column name, in SELECT/INSERT order.
    const COLUMNS: &'static [(&'static str, &'static str)];

    /// Text field -> column holding its [`fold_case`], written on every upsert.
    ///
    /// Case-insensitive search and ordering read these columns; fields
    /// without one fall back to the database's own `UPPER`.
    const FOLDED_COLUMNS: &'static [(&'static str, &'static str)] = &[];

    fn create_table(dialect: SqlDialect) -> &'static str;

    /// Values in [`Self::COLUMNS`] order.
    fn to_params(&self) -> Vec<SqlParam>;

    fn from_row(row: &AnyRow) -> Result<Self, StorageError>;
}

pub struct SqlStore<E> {
    pool: AnyPool,
    translator: SqlTranslator,
    _entity: PhantomData<fn() -> E>,
}

impl<E: SqlEntity> SqlStore<E> {
    /// Connect using `config.sql_url`, retrying connection and schema setup.
    pub async fn new(config: &SearchConfig) -> Result<Self, StorageError> {
        let url = config
            .sql_url
            .as_deref()
            .ok_or_else(|| StorageError::Connection("no sql_url configured".to_string()))?;
        install_drivers();

        let pool = retry("sql_connect", &RetryConfig::store_setup(), || async {
            AnyPoolOptions::new()
                .max_connections(config.sql_max_connections)
                .acquire_timeout(Duration::from_secs(config.sql_acquire_timeout_secs))
                .idle_timeout(Duration::from_secs(300))
                .connect(url)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))
        })
        .await?;

        Self::with_pool(pool, SqlDialect::from_url(url)).await
    }

    /// Connect to a URL with otherwise default settings.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let config = SearchConfig {
            sql_url: Some(url.to_string()),
            ..SearchConfig::default()
        };
        Self::new(&config).await
    }

    /// Build on an existing pool (e.g. one shared with another entity's store).
    pub async fn with_pool(pool: AnyPool, dialect: SqlDialect) -> Result<Self, StorageError> {
        let store = Self {
            pool,
            translator: SqlTranslator::new(dialect, E::schema(), E::COLUMNS, E::FOLDED_COLUMNS),
            _entity: PhantomData,
        };

        if dialect == SqlDialect::Sqlite {
            store.enable_wal_mode().await?;
        }
        store.init_schema().await?;
        info!(table = E::TABLE, ?dialect, "SQL store ready");
        Ok(store)
    }

    /// Get a clone of the connection pool for sharing with other stores.
    pub fn pool(&self) -> AnyPool {
        self.pool.clone()
    }

    pub fn translator(&self) -> &SqlTranslator {
        &self.translator
    }

    /// Enable WAL mode for SQLite so readers keep their snapshot while writers proceed.
    async fn enable_wal_mode(&self) -> Result<(), StorageError> {
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to enable WAL mode: {}", e)))?;

        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to set synchronous mode: {}", e)))?;

        Ok(())
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        let sql = E::create_table(self.translator.dialect());
        retry("sql_init_schema", &RetryConfig::store_setup(), || async {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))
        })
        .await?;
        Ok(())
    }

    fn upsert_sql() -> String {
        let columns: Vec<&str> = E::COLUMNS
            .iter()
            .chain(E::FOLDED_COLUMNS)
            .map(|(_, c)| *c)
            .collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        // REPLACE INTO is understood by both MySQL and SQLite
        format!(
            "REPLACE INTO {} ({}) VALUES ({})",
            E::TABLE,
            columns.join(", "),
            placeholders
        )
    }

    /// Column values followed by the fold of each folded field.
    fn row_params(entity: &E) -> Vec<SqlParam> {
        let mut params = entity.to_params();
        params.extend(E::FOLDED_COLUMNS.iter().map(|(field, _)| {
            entity
                .field(field)
                .and_then(|value| value.as_text())
                .map_or(SqlParam::Null, |text| SqlParam::Text(fold_case(text)))
        }));
        params
    }

    /// Insert or replace by id.
    pub async fn upsert(&self, entity: &E) -> Result<(), StorageError> {
        let sql = Self::upsert_sql();
        bind_all(sqlx::query(&sql), Self::row_params(entity))
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }

    /// Insert or replace many entities in one transaction.
    pub async fn upsert_batch(&self, entities: &[E]) -> Result<usize, StorageError> {
        let sql = Self::upsert_sql();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        for entity in entities {
            bind_all(sqlx::query(&sql), Self::row_params(entity))
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;
        }
        tx.commit()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        debug!(table = E::TABLE, count = entities.len(), "Batch upserted");
        Ok(entities.len())
    }

    /// Delete by id, returning whether a row was removed.
    pub async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", E::TABLE);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get(&self, id: i64) -> Result<Option<E>, StorageError> {
        let columns: Vec<&str> = E::COLUMNS.iter().map(|(_, c)| *c).collect();
        let sql = format!("SELECT {} FROM {} WHERE id = ?", columns.join(", "), E::TABLE);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        row.as_ref().map(E::from_row).transpose()
    }

    pub async fn count_all(&self) -> Result<u64, StorageError> {
        let sql = format!("SELECT COUNT(*) AS total FROM {}", E::TABLE);
        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let total: i64 = row
            .try_get("total")
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}

#[async_trait]
impl<E: SqlEntity> EntityStore<E> for SqlStore<E> {
    async fn begin_read(&self) -> Result<Box<dyn ReadSnapshot<E>>, StorageError> {
        // Not retried: a failed search surfaces to the caller as-is
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Box::new(SqlSnapshot {
            tx,
            translator: self.translator,
            _entity: PhantomData::<fn() -> E>,
        }))
    }
}

struct SqlSnapshot<E> {
    tx: Transaction<'static, Any>,
    translator: SqlTranslator,
    _entity: PhantomData<fn() -> E>,
}

#[async_trait]
impl<E: SqlEntity> ReadSnapshot<E> for SqlSnapshot<E> {
    async fn count(&mut self, predicate: &Query) -> Result<u64, StorageError> {
        let sql = self.translator.count_statement(E::TABLE, predicate);
        let row = bind_all(sqlx::query(&sql.clause), sql.params)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let total: i64 = row
            .try_get("total")
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn page(
        &mut self,
        predicate: &Query,
        sort: &SortSpec,
        window: PageWindow,
    ) -> Result<Vec<E>, StorageError> {
        if window.limit == 0 {
            return Ok(Vec::new());
        }
        let sql = self
            .translator
            .page_statement(E::TABLE, predicate, sort, window.offset, window.limit);
        let rows = bind_all(sqlx::query(&sql.clause), sql.params)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        rows.iter().map(E::from_row).collect()
    }

    async fn finish(self: Box<Self>) -> Result<(), StorageError> {
        // Read-only; nothing to commit
        let snapshot = *self;
        snapshot
            .tx
            .rollback()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))
    }
}

fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, Any, AnyArguments<'q>>,
    params: Vec<SqlParam>,
) -> sqlx::query::Query<'q, Any, AnyArguments<'q>> {
    for param in params {
        query = match param {
            SqlParam::Text(s) => query.bind(s),
            SqlParam::Integer(n) => query.bind(n),
            SqlParam::Real(n) => query.bind(n),
            SqlParam::Null => query.bind(None::<i64>),
        };
    }
    query
}

fn decode_err<E: Searchable>(column: &str, reason: impl std::fmt::Display) -> StorageError {
    StorageError::Decode {
        entity: E::schema().entity,
        reason: format!("{}: {}", column, reason),
    }
}

fn opt_text<E: Searchable>(row: &AnyRow, column: &str) -> Result<Option<String>, StorageError> {
    // Try reading as String first (SQLite TEXT), then as bytes (MySQL TEXT)
    if let Ok(value) = row.try_get::<Option<String>, _>(column) {
        return Ok(value);
    }
    row.try_get::<Option<Vec<u8>>, _>(column)
        .map_err(|e| decode_err::<E>(column, e))?
        .map(|bytes| String::from_utf8(bytes).map_err(|e| decode_err::<E>(column, e)))
        .transpose()
}

fn text<E: Searchable>(row: &AnyRow, column: &str) -> Result<String, StorageError> {
    opt_text::<E>(row, column)?.ok_or_else(|| decode_err::<E>(column, "unexpected NULL"))
}

fn integer<E: Searchable>(row: &AnyRow, column: &str) -> Result<i64, StorageError> {
    row.try_get(column).map_err(|e| decode_err::<E>(column, e))
}

fn timestamp<E: Searchable>(row: &AnyRow, column: &str) -> Result<DateTime<Utc>, StorageError> {
    let millis = integer::<E>(row, column)?;
    DateTime::from_timestamp_millis(millis).ok_or_else(|| decode_err::<E>(column, "timestamp out of range"))
}

fn decimal<E: Searchable>(row: &AnyRow, column: &str) -> Result<Decimal, StorageError> {
    let value: f64 = row.try_get(column).map_err(|e| decode_err::<E>(column, e))?;
    Decimal::from_f64(value).ok_or_else(|| decode_err::<E>(column, "not a finite number"))
}

fn text_param(value: &str) -> SqlParam {
    SqlParam::Text(value.to_string())
}

fn opt_text_param(value: Option<&str>) -> SqlParam {
    value.map_or(SqlParam::Null, text_param)
}

impl SqlEntity for User {
    const TABLE: &'static str = "users";

    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("id", "id"),
        ("firstName", "first_name"),
        ("middleName", "middle_name"),
        ("lastName", "last_name"),
        ("nickname", "nickname"),
        ("email", "email"),
        ("created", "created"),
    ];

    const FOLDED_COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("firstName", "first_name_fold"),
        ("middleName", "middle_name_fold"),
        ("lastName", "last_name_fold"),
        ("nickname", "nickname_fold"),
    ];

    fn create_table(dialect: SqlDialect) -> &'static str {
        match dialect {
            SqlDialect::Sqlite => {
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY,
                    first_name TEXT NOT NULL,
                    middle_name TEXT,
                    last_name TEXT NOT NULL,
                    nickname TEXT,
                    email TEXT NOT NULL,
                    created INTEGER NOT NULL,
                    first_name_fold TEXT NOT NULL,
                    middle_name_fold TEXT,
                    last_name_fold TEXT NOT NULL,
                    nickname_fold TEXT
                )
                "#
            }
            SqlDialect::MySql => {
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id BIGINT PRIMARY KEY,
                    first_name VARCHAR(255) NOT NULL,
                    middle_name VARCHAR(255),
                    last_name VARCHAR(255) NOT NULL,
                    nickname VARCHAR(255),
                    email VARCHAR(255) NOT NULL,
                    created BIGINT NOT NULL,
                    first_name_fold VARCHAR(768) NOT NULL,
                    middle_name_fold VARCHAR(768),
                    last_name_fold VARCHAR(768) NOT NULL,
                    nickname_fold VARCHAR(768),
                    INDEX idx_users_last_name (last_name)
                )
                "#
            }
        }
    }

    fn to_params(&self) -> Vec<SqlParam> {
        vec![
            SqlParam::Integer(self.id),
            text_param(&self.first_name),
            opt_text_param(self.middle_name.as_deref()),
            text_param(&self.last_name),
            opt_text_param(self.nickname.as_deref()),
            text_param(&self.email),
            SqlParam::Integer(self.created.timestamp_millis()),
        ]
    }

    fn from_row(row: &AnyRow) -> Result<Self, StorageError> {
        Ok(Self {
            id: integer::<Self>(row, "id")?,
            first_name: text::<Self>(row, "first_name")?,
            middle_name: opt_text::<Self>(row, "middle_name")?,
            last_name: text::<Self>(row, "last_name")?,
            nickname: opt_text::<Self>(row, "nickname")?,
            email: text::<Self>(row, "email")?,
            created: timestamp::<Self>(row, "created")?,
        })
    }
}

impl SqlEntity for Listing {
    const TABLE: &'static str = "listings";

    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("id", "id"),
        ("productName", "product_name"),
        ("businessName", "business_name"),
        ("businessType", "business_type"),
        ("price", "price"),
        ("quantity", "quantity"),
        ("created", "created"),
        ("closes", "closes"),
        ("suburb", "suburb"),
        ("city", "city"),
        ("region", "region"),
        ("country", "country"),
        ("moreInfo", "more_info"),
    ];

    const FOLDED_COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("productName", "product_name_fold"),
        ("businessName", "business_name_fold"),
        ("suburb", "suburb_fold"),
        ("city", "city_fold"),
        ("region", "region_fold"),
        ("country", "country_fold"),
    ];

    fn create_table(dialect: SqlDialect) -> &'static str {
        match dialect {
            SqlDialect::Sqlite => {
                r#"
                CREATE TABLE IF NOT EXISTS listings (
                    id INTEGER PRIMARY KEY,
                    product_name TEXT NOT NULL,
                    business_name TEXT NOT NULL,
                    business_type TEXT NOT NULL,
                    price REAL NOT NULL,
                    quantity INTEGER NOT NULL,
                    created INTEGER NOT NULL,
                    closes INTEGER NOT NULL,
                    suburb TEXT,
                    city TEXT,
                    region TEXT,
                    country TEXT,
                    more_info TEXT,
                    product_name_fold TEXT NOT NULL,
                    business_name_fold TEXT NOT NULL,
                    suburb_fold TEXT,
                    city_fold TEXT,
                    region_fold TEXT,
                    country_fold TEXT
                )
                "#
            }
            SqlDialect::MySql => {
                r#"
                CREATE TABLE IF NOT EXISTS listings (
                    id BIGINT PRIMARY KEY,
                    product_name VARCHAR(255) NOT NULL,
                    business_name VARCHAR(255) NOT NULL,
                    business_type VARCHAR(64) NOT NULL,
                    price DOUBLE NOT NULL,
                    quantity BIGINT NOT NULL,
                    created BIGINT NOT NULL,
                    closes BIGINT NOT NULL,
                    suburb VARCHAR(255),
                    city VARCHAR(255),
                    region VARCHAR(255),
                    country VARCHAR(255),
                    more_info TEXT,
                    product_name_fold VARCHAR(768) NOT NULL,
                    business_name_fold VARCHAR(768) NOT NULL,
                    suburb_fold VARCHAR(768),
                    city_fold VARCHAR(768),
                    region_fold VARCHAR(768),
                    country_fold VARCHAR(768),
                    INDEX idx_listings_closes (closes),
                    INDEX idx_listings_business_type (business_type)
                )
                "#
            }
        }
    }

    fn to_params(&self) -> Vec<SqlParam> {
        vec![
            SqlParam::Integer(self.id),
            text_param(&self.product_name),
            text_param(&self.business_name),
            text_param(self.business_type.as_str()),
            self.price.to_f64().map_or(SqlParam::Null, SqlParam::Real),
            SqlParam::Integer(self.quantity),
            SqlParam::Integer(self.created.timestamp_millis()),
            SqlParam::Integer(self.closes.timestamp_millis()),
            opt_text_param(self.location.suburb.as_deref()),
            opt_text_param(self.location.city.as_deref()),
            opt_text_param(self.location.region.as_deref()),
            opt_text_param(self.location.country.as_deref()),
            opt_text_param(self.more_info.as_deref()),
        ]
    }

    fn from_row(row: &AnyRow) -> Result<Self, StorageError> {
        let business_type: BusinessType = text::<Self>(row, "business_type")?
            .parse()
            .map_err(|e| decode_err::<Self>("business_type", e))?;
        Ok(Self {
            id: integer::<Self>(row, "id")?,
            product_name: text::<Self>(row, "product_name")?,
            business_name: text::<Self>(row, "business_name")?,
            business_type,
            price: decimal::<Self>(row, "price")?,
            quantity: integer::<Self>(row, "quantity")?,
            created: timestamp::<Self>(row, "created")?,
            closes: timestamp::<Self>(row, "closes")?,
            location: Location {
                suburb: opt_text::<Self>(row, "suburb")?,
                city: opt_text::<Self>(row, "city")?,
                region: opt_text::<Self>(row, "region")?,
                country: opt_text::<Self>(row, "country")?,
            },
            more_info: opt_text::<Self>(row, "more_info")?,
        })
    }
}
