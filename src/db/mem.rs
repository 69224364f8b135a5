//! In-memory `DonationStore` used by the test suites and for local
//! experimentation without Postgres.

use crate::db::store::{DonationStore, StoreError};
use crate::domain::{Donation, PaymentStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemDonationStore {
    donations: Mutex<Vec<Donation>>,
    fail_inserts: bool,
    insert_calls: AtomicUsize,
}

impl MemDonationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose inserts always fail, for exercising the
    /// abort-before-provider-call path.
    pub fn failing() -> Self {
        Self {
            fail_inserts: true,
            ..Self::default()
        }
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn seed(&self, donation: Donation) {
        self.donations.lock().unwrap().push(donation);
    }

    pub fn snapshot(&self) -> Vec<Donation> {
        self.donations.lock().unwrap().clone()
    }

    pub fn find(&self, reference: &str) -> Option<Donation> {
        self.donations
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.payment_reference == reference)
            .cloned()
    }
}

#[async_trait]
impl DonationStore for MemDonationStore {
    async fn insert(&self, donation: &Donation) -> Result<(), StoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts {
            return Err(StoreError::Database("insert rejected".to_string()));
        }
        self.donations.lock().unwrap().push(donation.clone());
        Ok(())
    }

    async fn get_by_reference(&self, reference: &str) -> Result<Option<Donation>, StoreError> {
        Ok(self.find(reference))
    }

    async fn mark_success(
        &self,
        reference: &str,
        transaction_id: &str,
        metadata: serde_json::Value,
    ) -> Result<(), StoreError> {
        let mut donations = self.donations.lock().unwrap();
        let donation = donations
            .iter_mut()
            .find(|d| d.payment_reference == reference)
            .ok_or_else(|| StoreError::NotFound(reference.to_string()))?;
        donation.payment_status = PaymentStatus::Success;
        donation.transaction_id = Some(transaction_id.to_string());
        donation.metadata = Some(metadata);
        donation.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_failed(
        &self,
        reference: &str,
        metadata: serde_json::Value,
    ) -> Result<(), StoreError> {
        let mut donations = self.donations.lock().unwrap();
        let donation = donations
            .iter_mut()
            .find(|d| d.payment_reference == reference)
            .ok_or_else(|| StoreError::NotFound(reference.to_string()))?;
        donation.payment_status = PaymentStatus::Failed;
        donation.metadata = Some(metadata);
        donation.updated_at = Utc::now();
        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Donation>, StoreError> {
        let donations = self.donations.lock().unwrap();
        Ok(donations
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_pending_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Donation>, StoreError> {
        let donations = self.donations.lock().unwrap();
        Ok(donations
            .iter()
            .filter(|d| d.payment_status == PaymentStatus::Pending && d.created_at < cutoff)
            .cloned()
            .collect())
    }
}
