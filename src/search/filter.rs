// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Structured filters and the predicate combiner.
//!
//! ```text
//! composite = (OR of name/location matches) AND businessType AND price window AND date window
//! ```
//!
//! Every absent filter imposes no constraint.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{BusinessType, FilterFields, Scalar};

use super::query_builder::{Query, QueryBuilder, QueryNode};

/// Optional structured constraints, all AND-ed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    #[serde(default)]
    pub business_type: Option<BusinessType>,
    #[serde(default)]
    pub min_price: Option<Decimal>,
    #[serde(default)]
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub from_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to_date: Option<DateTime<Utc>>,
}

/// Facet a filter constrains; used when the entity lacks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterFacet {
    BusinessType,
    Price,
    Date,
}

impl FilterFacet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BusinessType => "businessType",
            Self::Price => "price",
            Self::Date => "date",
        }
    }
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn business_type(mut self, business_type: BusinessType) -> Self {
        self.business_type = Some(business_type);
        self
    }

    pub fn price_between(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn dates_between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from_date = from;
        self.to_date = to;
        self
    }

    /// True when no constraint is present
    pub fn is_empty(&self) -> bool {
        self.business_type.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.from_date.is_none()
            && self.to_date.is_none()
    }

    /// Build the AND of every present constraint.
    ///
    /// Fails with the first facet that is requested but not supported by
    /// the entity's [`FilterFields`].
    pub fn to_query(&self, fields: FilterFields) -> Result<Query, FilterFacet> {
        let mut builder = QueryBuilder::new();

        if let Some(business_type) = self.business_type {
            let field = fields.business_type.ok_or(FilterFacet::BusinessType)?;
            builder = builder.field_eq(field, business_type.as_str());
        }

        if self.min_price.is_some() || self.max_price.is_some() {
            let field = fields.price.ok_or(FilterFacet::Price)?;
            builder = builder.range(
                field,
                self.min_price.map(Scalar::Decimal),
                self.max_price.map(Scalar::Decimal),
            );
        }

        if self.from_date.is_some() || self.to_date.is_some() {
            let field = fields.date.ok_or(FilterFacet::Date)?;
            builder = builder.range(
                field,
                self.from_date.map(Scalar::Timestamp),
                self.to_date.map(Scalar::Timestamp),
            );
        }

        Ok(builder.build_and())
    }
}

/// `matches AND filters`, skipping match-all operands.
pub fn combine(matches: Query, filters: Query) -> Query {
    if filters.root == QueryNode::MatchAll {
        matches
    } else if matches.root == QueryNode::MatchAll {
        filters
    } else {
        matches.and(filters)
    }
}
