//! Payment provider adapters.
//!
//! Each adapter owns the full initiate/verify contract for one external
//! provider: it generates the payment reference, writes the pending record
//! before any network call, talks to the provider over HTTP, and applies the
//! terminal status on verification. All transport and provider failures are
//! normalized into `ProviderError` at this boundary.

pub mod epaymently;
pub mod paystack;

pub use epaymently::{Epaymently, EpaymentlyConfig};
pub use paystack::{InlineCheckout, InlineOutcome, Paystack, PaystackConfig};

use crate::db::store::StoreError;
use crate::domain::{NewDonation, PaymentMethod};
use async_trait::async_trait;
use bigdecimal::{BigDecimal, ToPrimitive};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Payment provider is not configured (missing {0})")]
    NotConfigured(&'static str),
    #[error("Failed to create donation record")]
    RecordCreation(#[source] StoreError),
    #[error("{0}")]
    InvalidInput(String),
    #[error("Payment initialization failed: {0}")]
    InitializationFailed(String),
    #[error("Payment verification failed: {0}")]
    VerificationFailed(String),
    #[error("Payment cancelled")]
    Cancelled,
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Successful initiation. For redirect-style flows the caller navigates the
/// browser to `authorization_url`; the adapter itself never navigates.
#[derive(Debug, Clone, Serialize)]
pub struct Initiated {
    pub reference: String,
    pub authorization_url: String,
}

/// Outcome of a successful verification, with the raw provider payload kept
/// for display and audit.
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedPayment {
    pub reference: String,
    pub transaction_id: String,
    pub raw: serde_json::Value,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn method(&self) -> PaymentMethod;

    /// Registers a pending donation record and requests a charge setup from
    /// the provider. The record is written before the provider is contacted,
    /// so a confirmed charge can never exist without a local trace.
    async fn initiate(&self, input: &NewDonation) -> Result<Initiated, ProviderError>;

    /// Asks the provider for the final outcome of a previously initiated
    /// charge and reconciles the local record to a terminal status. Safe to
    /// re-run for an already-terminal reference.
    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, ProviderError>;
}

/// Converts a major-unit amount to integer minor units (x100) for providers
/// that demand them. Stored amounts stay in major units.
pub(crate) fn to_minor_units(amount: &BigDecimal) -> Result<i64, ProviderError> {
    (amount * BigDecimal::from(100))
        .with_scale(0)
        .to_i64()
        .ok_or_else(|| ProviderError::InvalidInput("Amount out of range".to_string()))
}

pub(crate) fn to_major_units(amount: &BigDecimal) -> Result<f64, ProviderError> {
    amount
        .to_f64()
        .ok_or_else(|| ProviderError::InvalidInput("Amount out of range".to_string()))
}

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_default()
}
