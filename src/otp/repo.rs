//! OTP persistence: store contract, `PostgreSQL` implementation, in-memory
//! implementation, and the background TTL sweeper.
//!
//! The engine only mutates records through [`OtpStore::update`]; deletion is
//! the sweeper's job. The `latest_for_phone` read backs the issuance cooldown
//! and must reflect prior writes from the same caller, which the Postgres
//! implementation gets from reading its own committed writes and the
//! in-memory one from a single mutex-guarded map.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, Instrument};
use uuid::Uuid;

use crate::otp::models::{OtpPurpose, OtpRecord};

#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn insert(&self, record: &OtpRecord) -> Result<()>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OtpRecord>>;

    /// Most recently created record for `(phone, purpose)`, for the
    /// issuance cooldown check.
    async fn latest_for_phone(
        &self,
        phone: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>>;

    /// Persist a status transition and/or attempts increment in place.
    async fn update(&self, record: &OtpRecord) -> Result<()>;

    /// Delete records whose `expires_at` lies more than `grace_seconds` in
    /// the past. Returns the number of reclaimed records.
    async fn purge_expired(&self, grace_seconds: u64) -> Result<u64>;
}

pub struct PgOtpStore {
    pool: PgPool,
}

impl PgOtpStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpStore for PgOtpStore {
    async fn insert(&self, record: &OtpRecord) -> Result<()> {
        let query = r"
            INSERT INTO otp_requests
                (id, phone, purpose, secret_hash, status, attempts, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(record.id)
            .bind(&record.phone)
            .bind(record.purpose.as_str())
            .bind(&record.secret_hash)
            .bind(record.status.as_str())
            .bind(record.attempts)
            .bind(record.created_at)
            .bind(record.expires_at)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert otp record")?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OtpRecord>> {
        let query = "SELECT * FROM otp_requests WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query_as::<_, OtpRecord>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to fetch otp record")
    }

    async fn latest_for_phone(
        &self,
        phone: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>> {
        let query = r"
            SELECT * FROM otp_requests
            WHERE phone = $1 AND purpose = $2
            ORDER BY created_at DESC
            LIMIT 1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query_as::<_, OtpRecord>(query)
            .bind(phone)
            .bind(purpose.as_str())
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to fetch latest otp record")
    }

    async fn update(&self, record: &OtpRecord) -> Result<()> {
        let query = "UPDATE otp_requests SET status = $2, attempts = $3 WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(record.id)
            .bind(record.status.as_str())
            .bind(record.attempts)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update otp record")?;
        Ok(())
    }

    async fn purge_expired(&self, grace_seconds: u64) -> Result<u64> {
        let query = r"
            DELETE FROM otp_requests
            WHERE expires_at < NOW() - ($1::bigint * INTERVAL '1 second')
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(i64::try_from(grace_seconds).unwrap_or(i64::MAX))
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to purge expired otp records")?;
        Ok(result.rows_affected())
    }
}

/// In-memory store for tests and provider-less local development.
#[derive(Default)]
pub struct MemoryOtpStore {
    records: Mutex<HashMap<Uuid, OtpRecord>>,
}

impl MemoryOtpStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn insert(&self, record: &OtpRecord) -> Result<()> {
        let mut records = self.records.lock().await;
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OtpRecord>> {
        let records = self.records.lock().await;
        Ok(records.get(&id).cloned())
    }

    async fn latest_for_phone(
        &self,
        phone: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>> {
        let records = self.records.lock().await;
        Ok(records
            .values()
            .filter(|record| record.phone == phone && record.purpose == purpose)
            .max_by_key(|record| record.created_at)
            .cloned())
    }

    async fn update(&self, record: &OtpRecord) -> Result<()> {
        let mut records = self.records.lock().await;
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn purge_expired(&self, grace_seconds: u64) -> Result<u64> {
        let cutoff = chrono::Utc::now()
            - chrono::Duration::seconds(i64::try_from(grace_seconds).unwrap_or(i64::MAX));
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, record| record.expires_at >= cutoff);
        Ok((before - records.len()) as u64)
    }
}

/// Spawn the periodic TTL sweep over an OTP store.
///
/// Reclamation is best-effort: the engines check `expires_at` on every read,
/// so a delayed sweep only costs storage, not correctness.
pub fn spawn_ttl_sweeper(
    store: Arc<dyn OtpStore>,
    interval: Duration,
    grace_seconds: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            sleep(interval).await;
            match store.purge_expired(grace_seconds).await {
                Ok(0) => {}
                Ok(purged) => debug!("Reclaimed {purged} expired otp records"),
                Err(err) => error!("OTP TTL sweep failed: {err:#}"),
            }
        }
    })
}
