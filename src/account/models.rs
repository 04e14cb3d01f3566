//! Account model and its sanitized public view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, types::Json, FromRow, Row};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    pub relation: String,
}

/// Full account row. Identity fields are immutable after registration.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    /// Stored normalized (trimmed, lowercased); unique case-insensitively.
    pub email: String,
    pub phone: String,
    pub phone_verified: bool,
    pub password_hash: String,
    pub emergency_contacts: Vec<EmergencyContact>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new account; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub phone_verified: bool,
    pub password_hash: String,
    pub emergency_contacts: Vec<EmergencyContact>,
}

/// What callers see: everything except the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccount {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub phone_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    #[must_use]
    pub fn sanitized(&self) -> PublicAccount {
        PublicAccount {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            phone_verified: self.phone_verified,
            created_at: self.created_at,
        }
    }
}

impl<'r> FromRow<'r, PgRow> for Account {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let contacts: Json<Vec<EmergencyContact>> = row.try_get("emergency_contacts")?;
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            phone_verified: row.try_get("phone_verified")?,
            password_hash: row.try_get("password_hash")?,
            emergency_contacts: contacts.0,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
