//! ePaymently adapter: redirect-only flow. Unlike Paystack, ePaymently takes
//! amounts in major units and reports completion as `status: "completed"`.

use crate::config::Config;
use crate::db::store::DonationStore;
use crate::domain::{generate_reference, Donation, NewDonation, PaymentMethod};
use crate::providers::{
    http_client, to_major_units, Initiated, PaymentProvider, ProviderError, VerifiedPayment,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const REFERENCE_PREFIX: &str = "PGC-EP";

#[derive(Debug, Clone)]
pub struct EpaymentlyConfig {
    pub api_key: Option<String>,
    pub merchant_id: Option<String>,
    pub base_url: Option<String>,
    pub callback_url: String,
    pub return_url: String,
}

impl EpaymentlyConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.epaymently_api_key.clone(),
            merchant_id: config.epaymently_merchant_id.clone(),
            base_url: config.epaymently_base_url.clone(),
            // The provider echoes the callback URL verbatim, so the
            // provider selector rides along as a query parameter.
            callback_url: format!(
                "{}/donations/callback?method=epaymently",
                config.site_base_url
            ),
            return_url: format!("{}/donation/success", config.site_base_url),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InitializeResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    payment_url: Option<String>,
}

pub struct Epaymently {
    config: EpaymentlyConfig,
    client: reqwest::Client,
    store: Arc<dyn DonationStore>,
}

impl Epaymently {
    pub fn new(config: EpaymentlyConfig, store: Arc<dyn DonationStore>) -> Self {
        Self {
            config,
            client: http_client(),
            store,
        }
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ProviderError::NotConfigured("EPAYMENTLY_API_KEY"))
    }

    fn merchant_id(&self) -> Result<&str, ProviderError> {
        self.config
            .merchant_id
            .as_deref()
            .filter(|m| !m.is_empty())
            .ok_or(ProviderError::NotConfigured("EPAYMENTLY_MERCHANT_ID"))
    }

    fn base_url(&self) -> Result<&str, ProviderError> {
        self.config
            .base_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(ProviderError::NotConfigured("EPAYMENTLY_BASE_URL"))
    }

    async fn fetch_verification(
        &self,
        api_key: &str,
        base_url: &str,
        reference: &str,
    ) -> Result<serde_json::Value, reqwest::Error> {
        let url = format!(
            "{}/api/v1/payments/verify/{}",
            base_url.trim_end_matches('/'),
            reference
        );
        self.client
            .get(&url)
            .bearer_auth(api_key)
            .send()
            .await?
            .json::<serde_json::Value>()
            .await
    }
}

#[async_trait]
impl PaymentProvider for Epaymently {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Epaymently
    }

    async fn initiate(&self, input: &NewDonation) -> Result<Initiated, ProviderError> {
        input.validate().map_err(ProviderError::InvalidInput)?;
        let api_key = self.api_key()?.to_string();
        let merchant_id = self.merchant_id()?.to_string();
        let base_url = self.base_url()?.to_string();
        let amount = to_major_units(&input.amount)?;

        let reference = generate_reference(REFERENCE_PREFIX);
        let donation = Donation::from_input(input, PaymentMethod::Epaymently, reference.clone());
        self.store
            .insert(&donation)
            .await
            .map_err(ProviderError::RecordCreation)?;

        let url = format!(
            "{}/api/v1/payments/initialize",
            base_url.trim_end_matches('/')
        );
        let body = json!({
            "merchant_id": merchant_id,
            "amount": amount,
            "currency": input.currency(),
            "reference": reference,
            "customer_email": input.donor_email,
            "customer_name": input.donor_name,
            "customer_phone": input.donor_phone,
            "callback_url": self.config.callback_url,
            "return_url": self.config.return_url,
            "metadata": {
                "donation_type": input.donation_type().as_str(),
                "message": input.message,
            },
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&api_key)
            .json(&body)
            .send()
            .await?
            .json::<InitializeResponse>()
            .await?;

        match response {
            InitializeResponse {
                success: true,
                payment_url: Some(payment_url),
                ..
            } => {
                tracing::info!(reference = %reference, "ePaymently charge initialized");
                Ok(Initiated {
                    reference,
                    authorization_url: payment_url,
                })
            }
            InitializeResponse { message, .. } => {
                tracing::warn!(reference = %reference, "ePaymently initialization rejected");
                Err(ProviderError::InitializationFailed(
                    message.unwrap_or_else(|| "Payment initialization failed".to_string()),
                ))
            }
        }
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, ProviderError> {
        let api_key = self.api_key()?.to_string();
        let base_url = self.base_url()?.to_string();

        match self
            .fetch_verification(&api_key, &base_url, reference)
            .await
        {
            Ok(body) => {
                let succeeded = body["success"].as_bool() == Some(true)
                    && body["status"].as_str() == Some("completed");
                if succeeded {
                    let Some(transaction_id) = body["transaction_id"].as_str() else {
                        self.store.mark_failed(reference, body.clone()).await?;
                        return Err(ProviderError::VerificationFailed(
                            "Provider response missing transaction id".to_string(),
                        ));
                    };
                    let transaction_id = transaction_id.to_string();
                    self.store
                        .mark_success(reference, &transaction_id, body.clone())
                        .await?;
                    tracing::info!(reference = %reference, transaction_id = %transaction_id,
                        "Donation verified");
                    Ok(VerifiedPayment {
                        reference: reference.to_string(),
                        transaction_id,
                        raw: body,
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

    fn config(base_url: &str) -> EpaymentlyConfig {
        EpaymentlyConfig {
            api_key: Some("ep_test_key".to_string()),
            merchant_id: Some("merchant-1".to_string()),
            base_url: Some(base_url.to_string()),
            callback_url: "http://localhost:3000/donations/callback?method=epaymently".to_string(),
            return_url: "http://localhost:3000/donation/success".to_string(),
        }
    }

    fn input() -> NewDonation {
        NewDonation {
            donor_name: "Jane Donor".to_string(),
            donor_email: "jane@example.com".to_string(),
            donor_phone: Some("+254700000000".to_string()),
            amount: BigDecimal::from_str("1000").unwrap(),
            currency: None,
            donation_type: None,
            message: None,
            is_anonymous: None,
        }
    }

    #[tokio::test]
    async fn test_initiate_sends_major_units() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/payments/initialize")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "amount": 1000.0,
                "merchant_id": "merchant-1",
                "currency": "KES",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":true,"payment_url":"https://pay.epaymently.example/xyz"}"#)
            .create_async()
            .await;

        let store = Arc::new(MemDonationStore::new());
        let provider = Epaymently::new(config(&server.url()), store.clone());

        let initiated = provider.initiate(&input()).await.unwrap();
        mock.assert_async().await;

        assert!(initiated.reference.starts_with("PGC-EP-"));
        assert_eq!(
            initiated.authorization_url,
            "https://pay.epaymently.example/xyz"
        );

        let record = store.find(&initiated.reference).unwrap();
        assert_eq!(record.payment_status, PaymentStatus::Pending);
        assert_eq!(record.payment_method, PaymentMethod::Epaymently);
    }

    #[tokio::test]
    async fn test_initiate_aborts_before_provider_when_insert_fails() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/payments/initialize")
            .expect(0)
            .create_async()
            .await;

        let store = Arc::new(MemDonationStore::failing());
        let provider = Epaymently::new(config(&server.url()), store.clone());

        let err = provider.initiate(&input()).await.unwrap_err();
        assert!(matches!(err, ProviderError::RecordCreation(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_initiate_without_credentials_degrades_to_error() {
        let mut cfg = config("http://127.0.0.1:1");
        cfg.api_key = None;
        let store = Arc::new(MemDonationStore::new());
        let provider = Epaymently::new(cfg, store.clone());

        let err = provider.initiate(&input()).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
        assert_eq!(store.insert_calls(), 0);
    }

    #[tokio::test]
    async fn test_verify_completed_sets_transaction_id() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/payments/verify/PGC-EP-1-ref")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":true,"status":"completed","transaction_id":"T1"}"#)
            .create_async()
            .await;

        let store = Arc::new(MemDonationStore::new());
        store.seed(Donation::from_input(
            &input(),
            PaymentMethod::Epaymently,
            "PGC-EP-1-ref".to_string(),
        ));
        let provider = Epaymently::new(config(&server.url()), store.clone());

        let verified = provider.verify("PGC-EP-1-ref").await.unwrap();
        assert_eq!(verified.transaction_id, "T1");

        let record = store.find("PGC-EP-1-ref").unwrap();
        assert_eq!(record.payment_status, PaymentStatus::Success);
        assert_eq!(record.transaction_id.as_deref(), Some("T1"));
    }

    #[tokio::test]
    async fn test_verify_non_completed_marks_failed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/payments/verify/PGC-EP-2-ref")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":true,"status":"pending"}"#)
            .create_async()
            .await;

        let store = Arc::new(MemDonationStore::new());
        store.seed(Donation::from_input(
            &input(),
            PaymentMethod::Epaymently,
            "PGC-EP-2-ref".to_string(),
        ));
        let provider = Epaymently::new(config(&server.url()), store.clone());

        let err = provider.verify("PGC-EP-2-ref").await.unwrap_err();
        assert!(matches!(err, ProviderError::VerificationFailed(_)));

        let record = store.find("PGC-EP-2-ref").unwrap();
        assert_eq!(record.payment_status, PaymentStatus::Failed);
        assert!(record.transaction_id.is_none());
    }
}
