//! Field groups: named concatenations of entity fields.
//!
//! Each searchable target has a static list of groups. A search phrase is
//! compared against every group of its target.

/// A named, ordered list of fields compared as one space-joined string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldGroup {
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

impl FieldGroup {
    pub const fn new(name: &'static str, fields: &'static [&'static str]) -> Self {
        Self { name, fields }
    }
}

/// User name variants.
pub const USER_NAME_GROUPS: &[FieldGroup] = &[
    FieldGroup::new("nickname", &["nickname"]),
    FieldGroup::new("firstMiddle", &["firstName", "middleName"]),
    FieldGroup::new("firstLast", &["firstName", "lastName"]),
    FieldGroup::new("middleLast", &["middleName", "lastName"]),
    FieldGroup::new("fullName", &["firstName", "middleName", "lastName"]),
];

pub const LISTING_PRODUCT_GROUPS: &[FieldGroup] =
    &[FieldGroup::new("productName", &["productName"])];

pub const LISTING_BUSINESS_GROUPS: &[FieldGroup] =
    &[FieldGroup::new("businessName", &["businessName"])];

/// Address components, each matched on its own.
pub const LISTING_LOCATION_GROUPS: &[FieldGroup] = &[
    FieldGroup::new("suburb", &["suburb"]),
    FieldGroup::new("region", &["region"]),
    FieldGroup::new("city", &["city"]),
    FieldGroup::new("country", &["country"]),
];

/// The four search instantiations exposed to handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchTarget {
    UserName,
    ListingProductName,
    ListingBusinessName,
    ListingLocation,
}

impl SearchTarget {
    pub fn field_groups(&self) -> &'static [FieldGroup] {
        match self {
            Self::UserName => USER_NAME_GROUPS,
            Self::ListingProductName => LISTING_PRODUCT_GROUPS,
            Self::ListingBusinessName => LISTING_BUSINESS_GROUPS,
            Self::ListingLocation => LISTING_LOCATION_GROUPS,
        }
    }

    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserName => "user_name",
            Self::ListingProductName => "listing_product_name",
            Self::ListingBusinessName => "listing_business_name",
            Self::ListingLocation => "listing_location",
        }
    }
}

impl std::fmt::Display for SearchTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Listing, Searchable, User};

    fn assert_groups_exist<E: Searchable>(groups: &[FieldGroup]) {
        for group in groups {
            assert!(!group.fields.is_empty(), "group {} is empty", group.name);
            for field in group.fields {
                assert!(E::schema().field(field).is_some(), "unknown field {}", field);
            }
        }
    }

    #[test]
    fn test_user_groups_reference_user_fields() {
        assert_eq!(USER_NAME_GROUPS.len(), 5);
        assert_groups_exist::<User>(SearchTarget::UserName.field_groups());
    }

    #[test]
    fn test_listing_groups_reference_listing_fields() {
        assert_groups_exist::<Listing>(SearchTarget::ListingProductName.field_groups());
        assert_groups_exist::<Listing>(SearchTarget::ListingBusinessName.field_groups());
        assert_groups_exist::<Listing>(SearchTarget::ListingLocation.field_groups());
        assert_eq!(LISTING_LOCATION_GROUPS.len(), 4);
    }
}
