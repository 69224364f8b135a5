//! Stale-pending reconciliation report.
//!
//! Initiation failures and abandoned redirects leave donation records in
//! `pending` forever; nothing in the payment flow revisits them. This
//! service surfaces those records as a report so an operator can follow up.
//! It is read-only: no policy is applied and no status is mutated.

use crate::db::store::{DonationStore, StoreError};
use crate::domain::Donation;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct StalePendingReport {
    pub generated_at: DateTime<Utc>,
    pub cutoff: DateTime<Utc>,
    pub older_than_hours: i64,
    pub total_pending: usize,
    pub entries: Vec<StalePendingEntry>,
}

#[derive(Debug, Serialize)]
pub struct StalePendingEntry {
    pub reference: String,
    pub payment_method: String,
    pub amount: String,
    pub currency: String,
    /// Omitted for anonymous donations.
    pub donor_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Donation> for StalePendingEntry {
    fn from(donation: Donation) -> Self {
        let donor_email = if donation.is_anonymous {
            None
        } else {
            Some(donation.donor_email)
        };
        Self {
            reference: donation.payment_reference,
            payment_method: donation.payment_method.as_str().to_string(),
            amount: donation.amount.to_string(),
            currency: donation.currency,
            donor_email,
            created_at: donation.created_at,
        }
    }
}

pub struct ReconciliationService {
    store: Arc<dyn DonationStore>,
}

impl ReconciliationService {
    pub fn new(store: Arc<dyn DonationStore>) -> Self {
        Self { store }
    }

    pub async fn stale_pending(
        &self,
        older_than_hours: i64,
    ) -> Result<StalePendingReport, StoreError> {
        let cutoff = Utc::now() - Duration::hours(older_than_hours);
        let pending = self.store.list_pending_older_than(cutoff).await?;

        info!(
            older_than_hours,
            count = pending.len(),
            "Stale-pending report generated"
        );

        Ok(StalePendingReport {
            generated_at: Utc::now(),
            cutoff,
            older_than_hours,
            total_pending: pending.len(),
            entries: pending.into_iter().map(StalePendingEntry::from).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemDonationStore;
    use crate::domain::{Donation, NewDonation, PaymentMethod, PaymentStatus};
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn donation(reference: &str, age_hours: i64, anonymous: bool) -> Donation {
        let input = NewDonation {
            donor_name: "Jane Donor".to_string(),
            donor_email: "jane@example.com".to_string(),
            donor_phone: None,
            amount: BigDecimal::from_str("250").unwrap(),
            currency: None,
            donation_type: None,
            message: None,
            is_anonymous: Some(anonymous),
        };
        let mut d = Donation::from_input(&input, PaymentMethod::Paystack, reference.to_string());
        d.created_at = Utc::now() - Duration::hours(age_hours);
        d
    }

    #[tokio::test]
    async fn test_report_lists_only_old_pending_records() {
        let store = Arc::new(MemDonationStore::new());
        store.seed(donation("PGC-old", 48, false));
        store.seed(donation("PGC-fresh", 1, false));

        let mut settled = donation("PGC-done", 48, false);
        settled.payment_status = PaymentStatus::Success;
        store.seed(settled);

        let report = ReconciliationService::new(store)
            .stale_pending(24)
            .await
            .unwrap();

        assert_eq!(report.total_pending, 1);
        assert_eq!(report.entries[0].reference, "PGC-old");
        assert_eq!(report.entries[0].amount, "250");
    }

    #[tokio::test]
    async fn test_report_hides_anonymous_donor_email() {
        let store = Arc::new(MemDonationStore::new());
        store.seed(donation("PGC-anon", 30, true));
        store.seed(donation("PGC-named", 30, false));

        let report = ReconciliationService::new(store)
            .stale_pending(24)
            .await
            .unwrap();

        let anon = report
            .entries
            .iter()
            .find(|e| e.reference == "PGC-anon")
            .unwrap();
        assert!(anon.donor_email.is_none());

        let named = report
            .entries
            .iter()
            .find(|e| e.reference == "PGC-named")
            .unwrap();
        assert_eq!(named.donor_email.as_deref(), Some("jane@example.com"));
    }
}
