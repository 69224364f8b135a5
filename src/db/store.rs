//! Persistence seam for donation records.
//!
//! Adapters and services hold an `Arc<dyn DonationStore>` so tests can
//! substitute an in-memory store without touching shared state.

use crate::db::{models::DonationRow, queries};
use crate::domain::Donation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Donation not found: {0}")]
    NotFound(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

#[async_trait]
pub trait DonationStore: Send + Sync {
    /// Inserts a new pending donation record.
    async fn insert(&self, donation: &Donation) -> Result<(), StoreError>;

    async fn get_by_reference(&self, reference: &str) -> Result<Option<Donation>, StoreError>;

    /// Transitions the record to `success`, attaching the provider's
    /// transaction id and raw response.
    async fn mark_success(
        &self,
        reference: &str,
        transaction_id: &str,
        metadata: serde_json::Value,
    ) -> Result<(), StoreError>;

    /// Transitions the record to `failed`, attaching the raw response or
    /// error detail.
    async fn mark_failed(
        &self,
        reference: &str,
        metadata: serde_json::Value,
    ) -> Result<(), StoreError>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Donation>, StoreError>;

    async fn list_pending_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Donation>, StoreError>;
}

/// Postgres-backed store used in production.
#[derive(Clone)]
pub struct PgDonationStore {
    pool: PgPool,
}

impl PgDonationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_domain(row: DonationRow) -> Result<Donation, StoreError> {
    Donation::try_from(row).map_err(StoreError::Database)
}

#[async_trait]
impl DonationStore for PgDonationStore {
    async fn insert(&self, donation: &Donation) -> Result<(), StoreError> {
        queries::insert_donation(&self.pool, donation).await?;
        Ok(())
    }

    async fn get_by_reference(&self, reference: &str) -> Result<Option<Donation>, StoreError> {
        match queries::get_by_reference(&self.pool, reference).await? {
            Some(row) => Ok(Some(into_domain(row)?)),
            None => Ok(None),
        }
    }

    async fn mark_success(
        &self,
        reference: &str,
        transaction_id: &str,
        metadata: serde_json::Value,
    ) -> Result<(), StoreError> {
        let rows = queries::mark_success(&self.pool, reference, transaction_id, &metadata).await?;
        if rows == 0 {
            return Err(StoreError::NotFound(reference.to_string()));
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        reference: &str,
        metadata: serde_json::Value,
    ) -> Result<(), StoreError> {
        let rows = queries::mark_failed(&self.pool, reference, &metadata).await?;
        if rows == 0 {
            return Err(StoreError::NotFound(reference.to_string()));
        }
        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Donation>, StoreError> {
        queries::list_donations(&self.pool, limit, offset)
            .await?
            .into_iter()
            .map(into_domain)
            .collect()
    }

    async fn list_pending_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Donation>, StoreError> {
        queries::list_pending_older_than(&self.pool, cutoff)
            .await?
            .into_iter()
            .map(into_domain)
            .collect()
    }
}
