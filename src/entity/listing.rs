//! Marketplace listing as seen by the search core.
//!
//! A listing is a sale offer for an inventory item: the product and business
//! names, the business type and address are flattened onto the listing so
//! every searchable facet is a direct field.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{EntitySchema, FieldDef, FieldKind, FieldValue, FilterFields, Searchable};

static LISTING_SCHEMA: EntitySchema = EntitySchema {
    entity: "listing",
    fields: &[
        FieldDef::sortable("id", FieldKind::Integer),
        FieldDef::sortable("productName", FieldKind::Text),
        FieldDef::sortable("businessName", FieldKind::Text),
        FieldDef::sortable("businessType", FieldKind::Text),
        FieldDef::sortable("price", FieldKind::Decimal),
        FieldDef::sortable("quantity", FieldKind::Integer),
        FieldDef::sortable("created", FieldKind::Timestamp),
        FieldDef::sortable("closes", FieldKind::Timestamp),
        FieldDef::sortable("suburb", FieldKind::Text),
        FieldDef::sortable("city", FieldKind::Text),
        FieldDef::sortable("region", FieldKind::Text),
        FieldDef::sortable("country", FieldKind::Text),
        FieldDef::unsortable("moreInfo", FieldKind::Text),
    ],
};

/// Category a business is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusinessType {
    AccommodationAndFoodServices,
    RetailTrade,
    CharitableOrganisation,
    NonProfitOrganisation,
}

impl BusinessType {
    pub const ALL: [BusinessType; 4] = [
        Self::AccommodationAndFoodServices,
        Self::RetailTrade,
        Self::CharitableOrganisation,
        Self::NonProfitOrganisation,
    ];

    /// Display name, which is also the stored field value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccommodationAndFoodServices => "Accommodation and Food Services",
            Self::RetailTrade => "Retail Trade",
            Self::CharitableOrganisation => "Charitable organisation",
            Self::NonProfitOrganisation => "Non-profit organisation",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::AccommodationAndFoodServices => "ACCOMMODATION_AND_FOOD_SERVICES",
            Self::RetailTrade => "RETAIL_TRADE",
            Self::CharitableOrganisation => "CHARITABLE_ORGANISATION",
            Self::NonProfitOrganisation => "NON_PROFIT_ORGANISATION",
        }
    }
}

impl fmt::Display for BusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown business type '{0}'")]
pub struct ParseBusinessTypeError(pub String);

impl FromStr for BusinessType {
    type Err = ParseBusinessTypeError;

    /// Accepts the display name (any case) or the SCREAMING_SNAKE code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(trimmed) || t.code() == trimmed)
            .ok_or_else(|| ParseBusinessTypeError(s.to_string()))
    }
}

/// Address components a listing can be found by.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub suburb: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

impl Location {
    pub fn new(
        suburb: Option<&str>,
        city: Option<&str>,
        region: Option<&str>,
        country: Option<&str>,
    ) -> Self {
        Self {
            suburb: suburb.map(str::to_string),
            city: city.map(str::to_string),
            region: region.map(str::to_string),
            country: country.map(str::to_string),
        }
    }
}

/// A listing offered on the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: i64,
    pub product_name: String,
    pub business_name: String,
    pub business_type: BusinessType,
    pub price: Decimal,
    pub quantity: i64,
    pub created: DateTime<Utc>,
    pub closes: DateTime<Utc>,
    #[serde(default)]
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more_info: Option<String>,
}

impl Listing {
    pub fn new(
        id: i64,
        product_name: impl Into<String>,
        business_name: impl Into<String>,
        business_type: BusinessType,
        price: Decimal,
        closes: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            product_name: product_name.into(),
            business_name: business_name.into(),
            business_type,
            price,
            quantity: 1,
            created: Utc::now(),
            closes,
            location: Location::default(),
            more_info: None,
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    pub fn with_more_info(mut self, more_info: impl Into<String>) -> Self {
        self.more_info = Some(more_info.into());
        self
    }
}

impl Searchable for Listing {
    fn schema() -> &'static EntitySchema {
        &LISTING_SCHEMA
    }

    fn filter_fields() -> FilterFields {
        FilterFields {
            business_type: Some("businessType"),
            price: Some("price"),
            date: Some("closes"),
        }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::Integer(self.id)),
            "productName" => Some(FieldValue::Text(&self.product_name)),
            "businessName" => Some(FieldValue::Text(&self.business_name)),
            "businessType" => Some(FieldValue::Text(self.business_type.as_str())),
            "price" => Some(FieldValue::Decimal(self.price)),
            "quantity" => Some(FieldValue::Integer(self.quantity)),
            "created" => Some(FieldValue::Timestamp(self.created)),
            "closes" => Some(FieldValue::Timestamp(self.closes)),
            "suburb" => self.location.suburb.as_deref().map(FieldValue::Text),
            "city" => self.location.city.as_deref().map(FieldValue::Text),
            "region" => self.location.region.as_deref().map(FieldValue::Text),
            "country" => self.location.country.as_deref().map(FieldValue::Text),
            "moreInfo" => self.more_info.as_deref().map(FieldValue::Text),
            _ => None,
        }
    }
}
