//! OTP record model and its persisted status machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use utoipa::ToSchema;
use uuid::Uuid;

/// What the caller intends to do once the phone number is proven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Signup,
    Login,
    PasswordReset,
}

impl OtpPurpose {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::Login => "login",
            Self::PasswordReset => "password_reset",
        }
    }

    /// Parse the persisted `otp_requests.purpose` textual value.
    fn from_db(value: &str) -> Result<Self, sqlx::Error> {
        match value {
            "signup" => Ok(Self::Signup),
            "login" => Ok(Self::Login),
            "password_reset" => Ok(Self::PasswordReset),
            _ => Err(sqlx::Error::Decode(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid otp_requests.purpose value: {value}"),
            )))),
        }
    }
}

/// Lifecycle status. `pending` is the only non-terminal state: records move
/// to `verified` on a correct code or to `expired` once past their validity
/// window, and never leave either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpStatus {
    Pending,
    Verified,
    Expired,
}

impl OtpStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Expired => "expired",
        }
    }

    fn from_db(value: &str) -> Result<Self, sqlx::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "expired" => Ok(Self::Expired),
            _ => Err(sqlx::Error::Decode(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid otp_requests.status value: {value}"),
            )))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OtpRecord {
    pub id: Uuid,
    pub phone: String,
    pub purpose: OtpPurpose,
    pub secret_hash: String,
    pub status: OtpStatus,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OtpRecord {
    /// Authoritative expiry check, independent of the store-level sweep.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

impl<'r> FromRow<'r, PgRow> for OtpRecord {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let purpose: String = row.try_get("purpose")?;
        let status: String = row.try_get("status")?;
        Ok(Self {
            id: row.try_get("id")?,
            phone: row.try_get("phone")?,
            purpose: OtpPurpose::from_db(&purpose)?,
            secret_hash: row.try_get("secret_hash")?,
            status: OtpStatus::from_db(&status)?,
            attempts: row.try_get("attempts")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
        })
    }
}
