//! Account persistence with store-enforced uniqueness.
//!
//! The engine's existence pre-check is not atomic with the create, so the
//! store itself must reject duplicates: the `PostgreSQL` implementation maps
//! a unique-index violation to [`CreateOutcome::Conflict`] instead of an
//! opaque error, and the in-memory one re-checks under its lock.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::account::models::{Account, NewAccount};

/// Outcome of attempting to create an account.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(Account),
    Conflict,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create an account, relying on store-level uniqueness for email and
    /// phone. A concurrent duplicate must surface as `Conflict`, not an
    /// internal error.
    async fn create(&self, account: NewAccount) -> Result<CreateOutcome>;

    /// Look up by normalized (lowercased) email.
    async fn find_by_email(&self, email_normalized: &str) -> Result<Option<Account>>;

    /// Existence probe for the registration pre-check.
    async fn find_by_email_or_phone(
        &self,
        email_normalized: &str,
        phone: &str,
    ) -> Result<Option<Account>>;
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create(&self, account: NewAccount) -> Result<CreateOutcome> {
        let query = r"
            INSERT INTO accounts
                (name, email, phone, phone_verified, password_hash, emergency_contacts)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query_as::<_, Account>(query)
            .bind(&account.name)
            .bind(&account.email)
            .bind(&account.phone)
            .bind(account.phone_verified)
            .bind(&account.password_hash)
            .bind(Json(&account.emergency_contacts))
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(created) => Ok(CreateOutcome::Created(created)),
            Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::Conflict),
            Err(err) => Err(err).context("failed to insert account"),
        }
    }

    async fn find_by_email(&self, email_normalized: &str) -> Result<Option<Account>> {
        let query = "SELECT * FROM accounts WHERE LOWER(email) = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query_as::<_, Account>(query)
            .bind(email_normalized)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to fetch account by email")
    }

    async fn find_by_email_or_phone(
        &self,
        email_normalized: &str,
        phone: &str,
    ) -> Result<Option<Account>> {
        let query = "SELECT * FROM accounts WHERE LOWER(email) = $1 OR phone = $2 LIMIT 1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query_as::<_, Account>(query)
            .bind(email_normalized)
            .bind(phone)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to probe for existing account")
    }
}

/// In-memory store for tests and provider-less local development.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<Vec<Account>>,
}

impl MemoryAccountStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create(&self, account: NewAccount) -> Result<CreateOutcome> {
        let mut accounts = self.accounts.lock().await;
        let duplicate = accounts.iter().any(|existing| {
            existing.email.eq_ignore_ascii_case(&account.email) || existing.phone == account.phone
        });
        if duplicate {
            return Ok(CreateOutcome::Conflict);
        }

        let now = chrono::Utc::now();
        let created = Account {
            id: uuid::Uuid::new_v4(),
            name: account.name,
            email: account.email,
            phone: account.phone,
            phone_verified: account.phone_verified,
            password_hash: account.password_hash,
            emergency_contacts: account.emergency_contacts,
            created_at: now,
            updated_at: now,
        };
        accounts.push(created.clone());
        Ok(CreateOutcome::Created(created))
    }

    async fn find_by_email(&self, email_normalized: &str) -> Result<Option<Account>> {
        let accounts = self.accounts.lock().await;
        Ok(accounts
            .iter()
            .find(|account| account.email.eq_ignore_ascii_case(email_normalized))
            .cloned())
    }

    async fn find_by_email_or_phone(
        &self,
        email_normalized: &str,
        phone: &str,
    ) -> Result<Option<Account>> {
        let accounts = self.accounts.lock().await;
        Ok(accounts
            .iter()
            .find(|account| {
                account.email.eq_ignore_ascii_case(email_normalized) || account.phone == phone
            })
            .cloned())
    }
}
