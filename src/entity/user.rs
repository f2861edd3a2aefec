//! User account as seen by the search core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntitySchema, FieldDef, FieldKind, FieldValue, Searchable};

static USER_SCHEMA: EntitySchema = EntitySchema {
    entity: "user",
    fields: &[
        FieldDef::sortable("id", FieldKind::Integer),
        FieldDef::sortable("firstName", FieldKind::Text),
        FieldDef::sortable("middleName", FieldKind::Text),
        FieldDef::sortable("lastName", FieldKind::Text),
        FieldDef::sortable("nickname", FieldKind::Text),
        FieldDef::sortable("email", FieldKind::Text),
        FieldDef::sortable("created", FieldKind::Timestamp),
    ],
};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub email: String,
    pub created: DateTime<Utc>,
}

impl User {
    /// Create a user with the required name parts; email is derived from the id.
    pub fn new(id: i64, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            middle_name: None,
            last_name: last_name.into(),
            nickname: None,
            email: format!("user{}@example.com", id),
            created: Utc::now(),
        }
    }

    pub fn with_middle_name(mut self, middle_name: impl Into<String>) -> Self {
        self.middle_name = Some(middle_name.into());
        self
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }
}

impl Searchable for User {
    fn schema() -> &'static EntitySchema {
        &USER_SCHEMA
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::Integer(self.id)),
            "firstName" => Some(FieldValue::Text(&self.first_name)),
            "middleName" => self.middle_name.as_deref().map(FieldValue::Text),
            "lastName" => Some(FieldValue::Text(&self.last_name)),
            "nickname" => self.nickname.as_deref().map(FieldValue::Text),
            "email" => Some(FieldValue::Text(&self.email)),
            "created" => Some(FieldValue::Timestamp(self.created)),
            _ => None,
        }
    }
}
