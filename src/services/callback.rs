//! Donation callback resolution.
//!
//! When the browser returns from an external payment flow, the callback
//! entry point carries a reference in either the `reference` or `trxref`
//! query parameter and an optional `method` selector. Resolution performs
//! exactly one verification attempt and lands in a terminal state; re-entry
//! (page reload) re-runs verification, which is safe because verification
//! re-applies the same terminal status.

use crate::domain::PaymentMethod;
use crate::providers::{PaymentProvider, ProviderError, VerifiedPayment};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

const INVALID_REFERENCE: &str = "Invalid payment reference";
const UNKNOWN_PROVIDER: &str = "Unknown payment provider";
const GENERIC_FAILURE: &str = "An error occurred while verifying your payment";

/// Query parameters accepted at the callback entry point.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pub reference: Option<String>,
    pub trxref: Option<String>,
    pub method: Option<String>,
}

impl CallbackParams {
    fn reference(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .filter(|r| !r.is_empty())
            .or_else(|| self.trxref.as_deref().filter(|r| !r.is_empty()))
    }
}

/// Callback lifecycle. Entry is always `Verifying`; `resolve` moves to one
/// of the two terminal states.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallbackState {
    Verifying,
    Success {
        message: String,
        details: VerifiedPayment,
    },
    Failed {
        message: String,
    },
}

impl CallbackState {
    pub fn is_success(&self) -> bool {
        matches!(self, CallbackState::Success { .. })
    }
}

pub struct CallbackService {
    providers: HashMap<PaymentMethod, Arc<dyn PaymentProvider>>,
}

impl CallbackService {
    pub fn new(providers: Vec<Arc<dyn PaymentProvider>>) -> Self {
        Self {
            providers: providers.into_iter().map(|p| (p.method(), p)).collect(),
        }
    }

    /// Resolves one callback entry from `Verifying` to a terminal state.
    /// Missing references and unknown providers short-circuit without any
    /// network call; provider errors are caught here and never propagate.
    pub async fn resolve(&self, params: &CallbackParams) -> CallbackState {
        let Some(reference) = params.reference() else {
            tracing::warn!("Callback entered without a payment reference");
            return CallbackState::Failed {
                message: INVALID_REFERENCE.to_string(),
            };
        };

        let method = match params.method.as_deref() {
            None => PaymentMethod::Paystack,
            Some(raw) => match raw.parse::<PaymentMethod>() {
                Ok(method) => method,
                Err(_) => {
                    tracing::warn!(method = %raw, "Callback named an unknown provider");
                    return CallbackState::Failed {
                        message: UNKNOWN_PROVIDER.to_string(),
                    };
                }
            },
        };

        let Some(provider) = self.providers.get(&method) else {
            return CallbackState::Failed {
                message: UNKNOWN_PROVIDER.to_string(),
            };
        };

        tracing::info!(reference = %reference, method = %method, "Verifying donation callback");

        match provider.verify(reference).await {
            Ok(details) => CallbackState::Success {
                message: "Thank you for your generous donation!".to_string(),
                details,
            },
            Err(err) => CallbackState::Failed {
                message: failure_message(err),
            },
        }
    }
}

fn failure_message(err: ProviderError) -> String {
    match err {
        ProviderError::VerificationFailed(message) if !message.is_empty() => message,
        other => {
            tracing::error!(error = %other, "Callback verification errored");
            GENERIC_FAILURE.to_string()
        }
    }
}
