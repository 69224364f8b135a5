//! Paystack adapter: redirect-style initialization, inline widget sessions,
//! and verify-by-reference. Paystack expects amounts in minor units (x100).

use crate::config::Config;
use crate::db::store::DonationStore;
use crate::domain::{generate_reference, Donation, NewDonation, PaymentMethod};
use crate::providers::{
    http_client, to_minor_units, Initiated, PaymentProvider, ProviderError, VerifiedPayment,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const REFERENCE_PREFIX: &str = "PGC";

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub public_key: Option<String>,
    pub secret_key: Option<String>,
    pub base_url: String,
    pub callback_url: String,
}

impl PaystackConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            public_key: config.paystack_public_key.clone(),
            secret_key: config.paystack_secret_key.clone(),
            base_url: config.paystack_base_url.clone(),
            callback_url: format!("{}/donations/callback", config.site_base_url),
        }
    }
}

/// Configuration handed to the client-side inline widget. The backend writes
/// the pending record and the widget performs the charge against this
/// reference; no server-side provider call happens at this stage.
#[derive(Debug, Clone, Serialize)]
pub struct InlineCheckout {
    pub public_key: String,
    pub email: String,
    pub amount: i64,
    pub currency: String,
    pub reference: String,
    pub metadata: serde_json::Value,
}

/// How the inline widget finished on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineOutcome {
    Cancelled,
    Completed,
}

#[derive(Debug, Deserialize)]
struct InitializeResponse {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<InitializeData>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
}

pub struct Paystack {
    config: PaystackConfig,
    client: reqwest::Client,
    store: Arc<dyn DonationStore>,
}

impl Paystack {
    pub fn new(config: PaystackConfig, store: Arc<dyn DonationStore>) -> Self {
        Self {
            config,
            client: http_client(),
            store,
        }
    }

    fn secret_key(&self) -> Result<&str, ProviderError> {
        self.config
            .secret_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ProviderError::NotConfigured("PAYSTACK_SECRET_KEY"))
    }

    fn public_key(&self) -> Result<&str, ProviderError> {
        self.config
            .public_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ProviderError::NotConfigured("PAYSTACK_PUBLIC_KEY"))
    }

    fn charge_metadata(input: &NewDonation) -> serde_json::Value {
        json!({
            "donor_name": input.donor_name,
            "donation_type": input.donation_type().as_str(),
            "custom_fields": [{
                "display_name": "Donor Name",
                "variable_name": "donor_name",
                "value": input.donor_name,
            }],
        })
    }

    /// Writes the pending record and returns the widget configuration for
    /// the embedded payment flow.
    pub async fn inline_checkout(&self, input: &NewDonation) -> Result<InlineCheckout, ProviderError> {
        input.validate().map_err(ProviderError::InvalidInput)?;
        let public_key = self.public_key()?.to_string();
        let amount = to_minor_units(&input.amount)?;

        let reference = generate_reference(REFERENCE_PREFIX);
        let donation = Donation::from_input(input, PaymentMethod::Paystack, reference.clone());
        self.store
            .insert(&donation)
            .await
            .map_err(ProviderError::RecordCreation)?;

        tracing::info!(reference = %reference, "Opened inline checkout session");

        Ok(InlineCheckout {
            public_key,
            email: input.donor_email.clone(),
            amount,
            currency: input.currency().to_string(),
            reference,
            metadata: json!({
                "donor_name": input.donor_name,
                "donation_type": input.donation_type().as_str(),
            }),
        })
    }

    /// Resolves an inline widget outcome. Cancellation is a terminal outcome
    /// for the caller but deliberately leaves the stored record pending;
    /// completion dispatches a normal verification.
    pub async fn complete_inline(
        &self,
        reference: &str,
        outcome: InlineOutcome,
    ) -> Result<VerifiedPayment, ProviderError> {
        match outcome {
            InlineOutcome::Cancelled => {
                tracing::info!(reference = %reference, "Inline checkout cancelled by donor");
                Err(ProviderError::Cancelled)
            }
            InlineOutcome::Completed => self.verify(reference).await,
        }
    }

    async fn fetch_verification(
        &self,
        secret_key: &str,
        reference: &str,
    ) -> Result<serde_json::Value, reqwest::Error> {
        let url = format!(
            "{}/transaction/verify/{}",
            self.config.base_url.trim_end_matches('/'),
            reference
        );
        self.client
            .get(&url)
            .bearer_auth(secret_key)
            .send()
            .await?
            .json::<serde_json::Value>()
            .await
    }
}

#[async_trait]
impl PaymentProvider for Paystack {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Paystack
    }

    async fn initiate(&self, input: &NewDonation) -> Result<Initiated, ProviderError> {
        input.validate().map_err(ProviderError::InvalidInput)?;
        let secret_key = self.secret_key()?.to_string();
        let amount = to_minor_units(&input.amount)?;

        let reference = generate_reference(REFERENCE_PREFIX);
        let donation = Donation::from_input(input, PaymentMethod::Paystack, reference.clone());
        self.store
            .insert(&donation)
            .await
            .map_err(ProviderError::RecordCreation)?;

        let url = format!(
            "{}/transaction/initialize",
            self.config.base_url.trim_end_matches('/')
        );
        let body = json!({
            "email": input.donor_email,
            "amount": amount,
            "currency": input.currency(),
            "reference": reference,
            "callback_url": self.config.callback_url,
            "metadata": Self::charge_metadata(input),
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&secret_key)
            .json(&body)
            .send()
            .await?
            .json::<InitializeResponse>()
            .await?;

        match response {
            InitializeResponse {
                status: true,
                data: Some(data),
                ..
            } => {
                tracing::info!(reference = %reference, "Paystack charge initialized");
                Ok(Initiated {
                    reference,
                    authorization_url: data.authorization_url,
                })
            }
            InitializeResponse { message, .. } => {
                tracing::warn!(reference = %reference, "Paystack initialization rejected");
                Err(ProviderError::InitializationFailed(
                    message.unwrap_or_else(|| "Payment initialization failed".to_string()),
                ))
            }
        }
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, ProviderError> {
        let secret_key = self.secret_key()?.to_string();

        match self.fetch_verification(&secret_key, reference).await {
            Ok(body) => {
                let succeeded = body["status"].as_bool() == Some(true)
                    && body["data"]["status"].as_str() == Some("success");
                if succeeded {
                    let transaction_id = match &body["data"]["id"] {
                        serde_json::Value::Number(n) => n.to_string(),
                        serde_json::Value::String(s) => s.clone(),
                        _ => {
                            self.store.mark_failed(reference, body.clone()).await?;
                            return Err(ProviderError::VerificationFailed(
                                "Provider response missing transaction id".to_string(),
                            ));
                        }
                    };
                    self.store
                        .mark_success(reference, &transaction_id, body["data"].clone())
                        .await?;
                    tracing::info!(reference = %reference, transaction_id = %transaction_id,
                        "Donation verified");
                    Ok(VerifiedPayment {
                        reference: reference.to_string(),
                        transaction_id,
                        raw: body["data"].clone(),
                    })
                } else {
                    self.store.mark_failed(reference, body).await?;
                    tracing::warn!(reference = %reference, "Donation verification rejected");
                    Err(ProviderError::VerificationFailed(
                        "Payment verification failed".to_string(),
                    ))
                }
            }
            Err(err) => {
                self.store
                    .mark_failed(reference, json!({ "error": err.to_string() }))
                    .await?;
                tracing::error!(reference = %reference, error = %err, "Verification call failed");
                Err(ProviderError::VerificationFailed(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemDonationStore;
    use crate::domain::PaymentStatus;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn config(base_url: &str) -> PaystackConfig {
        PaystackConfig {
            public_key: Some("pk_test_abc".to_string()),
            secret_key: Some("sk_test_abc".to_string()),
            base_url: base_url.to_string(),
            callback_url: "http://localhost:3000/donations/callback".to_string(),
        }
    }

    fn input() -> NewDonation {
        NewDonation {
            donor_name: "Jane Donor".to_string(),
            donor_email: "jane@example.com".to_string(),
            donor_phone: None,
            amount: BigDecimal::from_str("1000").unwrap(),
            currency: None,
            donation_type: None,
            message: None,
            is_anonymous: None,
        }
    }

    fn seeded_pending(store: &MemDonationStore, reference: &str) {
        store.seed(Donation::from_input(
            &input(),
            PaymentMethod::Paystack,
            reference.to_string(),
        ));
    }

    #[tokio::test]
    async fn test_initiate_creates_pending_record_and_returns_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/transaction/initialize")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "amount": 100_000,
                "currency": "KES",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":true,"data":{"authorization_url":"https://pay.example/abc","access_code":"abc","reference":"ignored"}}"#)
            .create_async()
            .await;

        let store = Arc::new(MemDonationStore::new());
        let provider = Paystack::new(config(&server.url()), store.clone());

        let initiated = provider.initiate(&input()).await.unwrap();
        mock.assert_async().await;

        assert!(initiated.reference.starts_with("PGC-"));
        assert_eq!(initiated.authorization_url, "https://pay.example/abc");

        let record = store.find(&initiated.reference).unwrap();
        assert_eq!(record.payment_status, PaymentStatus::Pending);
        assert_eq!(record.currency, "KES");
    }

    #[tokio::test]
    async fn test_initiate_aborts_before_provider_when_insert_fails() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/transaction/initialize")
            .expect(0)
            .create_async()
            .await;

        let store = Arc::new(MemDonationStore::failing());
        let provider = Paystack::new(config(&server.url()), store.clone());

        let err = provider.initiate(&input()).await.unwrap_err();
        assert!(matches!(err, ProviderError::RecordCreation(_)));
        assert_eq!(store.insert_calls(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_initiate_surfaces_provider_rejection() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/transaction/initialize")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":false,"message":"Invalid key"}"#)
            .create_async()
            .await;

        let store = Arc::new(MemDonationStore::new());
        let provider = Paystack::new(config(&server.url()), store.clone());

        let err = provider.initiate(&input()).await.unwrap_err();
        match err {
            ProviderError::InitializationFailed(message) => assert_eq!(message, "Invalid key"),
            other => panic!("unexpected error: {other:?}"),
        }

        // The pending record stays behind for later reconciliation.
        let records = store.snapshot();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_initiate_without_secret_key_never_touches_store() {
        let mut cfg = config("http://127.0.0.1:1");
        cfg.secret_key = None;
        let store = Arc::new(MemDonationStore::new());
        let provider = Paystack::new(cfg, store.clone());

        let err = provider.initiate(&input()).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
        assert_eq!(store.insert_calls(), 0);
    }

    #[tokio::test]
    async fn test_verify_success_marks_record_and_sets_transaction_id() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/transaction/verify/PGC-1-ref")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":true,"data":{"id":12345,"status":"success","amount":100000,"reference":"PGC-1-ref"}}"#)
            .create_async()
            .await;

        let store = Arc::new(MemDonationStore::new());
        seeded_pending(&store, "PGC-1-ref");
        let provider = Paystack::new(config(&server.url()), store.clone());

        let verified = provider.verify("PGC-1-ref").await.unwrap();
        assert_eq!(verified.transaction_id, "12345");

        let record = store.find("PGC-1-ref").unwrap();
        assert_eq!(record.payment_status, PaymentStatus::Success);
        assert_eq!(record.transaction_id.as_deref(), Some("12345"));
        assert!(record.metadata.is_some());
    }

    #[tokio::test]
    async fn test_verify_is_idempotent_for_terminal_reference() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/transaction/verify/PGC-2-ref")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":true,"data":{"id":77,"status":"success"}}"#)
            .expect(2)
            .create_async()
            .await;

        let store = Arc::new(MemDonationStore::new());
        seeded_pending(&store, "PGC-2-ref");
        let provider = Paystack::new(config(&server.url()), store.clone());

        provider.verify("PGC-2-ref").await.unwrap();
        let first = store.find("PGC-2-ref").unwrap();

        provider.verify("PGC-2-ref").await.unwrap();
        let second = store.find("PGC-2-ref").unwrap();

        assert_eq!(first.payment_status, second.payment_status);
        assert_eq!(first.transaction_id, second.transaction_id);
    }

    #[tokio::test]
    async fn test_verify_failure_marks_record_failed_without_transaction_id() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/transaction/verify/PGC-3-ref")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":true,"data":{"id":99,"status":"abandoned"}}"#)
            .create_async()
            .await;

        let store = Arc::new(MemDonationStore::new());
        seeded_pending(&store, "PGC-3-ref");
        let provider = Paystack::new(config(&server.url()), store.clone());

        let err = provider.verify("PGC-3-ref").await.unwrap_err();
        assert!(matches!(err, ProviderError::VerificationFailed(_)));

        let record = store.find("PGC-3-ref").unwrap();
        assert_eq!(record.payment_status, PaymentStatus::Failed);
        assert!(record.transaction_id.is_none());
    }

    #[tokio::test]
    async fn test_verify_transport_error_marks_record_failed_with_detail() {
        // Nothing listens on this port, so the call errors at the transport
        // layer rather than with a provider response.
        let store = Arc::new(MemDonationStore::new());
        seeded_pending(&store, "PGC-4-ref");
        let provider = Paystack::new(config("http://127.0.0.1:1"), store.clone());

        let err = provider.verify("PGC-4-ref").await.unwrap_err();
        assert!(matches!(err, ProviderError::VerificationFailed(_)));

        let record = store.find("PGC-4-ref").unwrap();
        assert_eq!(record.payment_status, PaymentStatus::Failed);
        let metadata = record.metadata.unwrap();
        assert!(metadata["error"].as_str().unwrap().len() > 0);
    }

    #[tokio::test]
    async fn test_inline_checkout_returns_widget_config_with_minor_units() {
        let store = Arc::new(MemDonationStore::new());
        let provider = Paystack::new(config("http://127.0.0.1:1"), store.clone());

        let checkout = provider.inline_checkout(&input()).await.unwrap();
        assert_eq!(checkout.amount, 100_000);
        assert_eq!(checkout.public_key, "pk_test_abc");
        assert!(checkout.reference.starts_with("PGC-"));

        let record = store.find(&checkout.reference).unwrap();
        assert_eq!(record.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_inline_cancellation_leaves_record_pending() {
        let store = Arc::new(MemDonationStore::new());
        seeded_pending(&store, "PGC-5-ref");
        let provider = Paystack::new(config("http://127.0.0.1:1"), store.clone());

        let err = provider
            .complete_inline("PGC-5-ref", InlineOutcome::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Cancelled));

        let record = store.find("PGC-5-ref").unwrap();
        assert_eq!(record.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_inline_completion_dispatches_verification() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/transaction/verify/PGC-6-ref")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":true,"data":{"id":42,"status":"success"}}"#)
            .create_async()
            .await;

        let store = Arc::new(MemDonationStore::new());
        seeded_pending(&store, "PGC-6-ref");
        let provider = Paystack::new(config(&server.url()), store.clone());

        let verified = provider
            .complete_inline("PGC-6-ref", InlineOutcome::Completed)
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(verified.transaction_id, "42");
    }
}
