use crate::domain::{NewDonation, PaymentMethod};
use crate::error::AppError;
use crate::providers::{InlineOutcome, PaymentProvider, ProviderError};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

#[derive(Debug, Deserialize)]
pub struct InitiateRequest {
    #[serde(flatten)]
    pub donation: NewDonation,
    pub payment_method: PaymentMethod,
}

/// Envelope returned by the initiation endpoints. Provider failures are
/// reported inside the envelope so the intake form can branch on `success`;
/// only donor-input validation problems become HTTP errors.
#[derive(Debug, Serialize)]
pub struct InitiateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InitiateResponse {
    fn ok(reference: String, authorization_url: String) -> Self {
        Self {
            success: true,
            reference: Some(reference),
            authorization_url: Some(authorization_url),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            reference: None,
            authorization_url: None,
            error: Some(message),
        }
    }
}

/// Starts a redirect-style payment flow. The caller is responsible for
/// navigating the browser to the returned authorization URL.
pub async fn initiate_donation(
    State(state): State<AppState>,
    Json(request): Json<InitiateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = match request.payment_method {
        PaymentMethod::Paystack => state.paystack.initiate(&request.donation).await,
        PaymentMethod::Epaymently => state.epaymently.initiate(&request.donation).await,
    };

    match result {
        Ok(initiated) => Ok(Json(InitiateResponse::ok(
            initiated.reference,
            initiated.authorization_url,
        ))),
        Err(ProviderError::InvalidInput(message)) => Err(AppError::ValidationError(message)),
        Err(err) => Ok(Json(InitiateResponse::err(err.to_string()))),
    }
}

/// Opens a Paystack inline checkout session and returns the widget
/// configuration for the embedded flow.
pub async fn inline_checkout(
    State(state): State<AppState>,
    Json(input): Json<NewDonation>,
) -> Result<impl IntoResponse, AppError> {
    match state.paystack.inline_checkout(&input).await {
        Ok(checkout) => Ok(Json(serde_json::json!({
            "success": true,
            "checkout": checkout,
        }))),
        Err(ProviderError::InvalidInput(message)) => Err(AppError::ValidationError(message)),
        Err(err) => Ok(Json(serde_json::json!({
            "success": false,
            "error": err.to_string(),
        }))),
    }
}

#[derive(Debug, Deserialize)]
pub struct InlineCompletionRequest {
    pub reference: String,
    pub outcome: InlineOutcome,
}

/// Resolves an inline widget outcome reported by the client: cancellation
/// is surfaced as a failure without touching the stored record, completion
/// triggers verification.
pub async fn complete_inline(
    State(state): State<AppState>,
    Json(request): Json<InlineCompletionRequest>,
) -> Result<impl IntoResponse, AppError> {
    match state
        .paystack
        .complete_inline(&request.reference, request.outcome)
        .await
    {
        Ok(verified) => Ok(Json(serde_json::json!({
            "success": true,
            "reference": verified.reference,
            "transaction_id": verified.transaction_id,
        }))),
        Err(err) => Ok(Json(serde_json::json!({
            "success": false,
            "error": err.to_string(),
        }))),
    }
}

/// Fetch one donation by its payment reference.
#[utoipa::path(
    get,
    path = "/donations/{reference}",
    params(
        ("reference" = String, Path, description = "Payment reference")
    ),
    responses(
        (status = 200, description = "Donation found"),
        (status = 404, description = "Donation not found"),
        (status = 500, description = "Database error")
    ),
    tag = "Donations"
)]
pub async fn get_donation(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let donation = state
        .store
        .get_by_reference(&reference)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Donation {} not found", reference)))?;

    Ok(Json(donation))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DonationListResponse {
    pub donations: Vec<crate::domain::Donation>,
    pub limit: i64,
    pub offset: i64,
}

pub async fn list_donations(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let limit = pagination.limit.unwrap_or(20).clamp(1, 100);
    let offset = pagination.offset.unwrap_or(0).max(0);

    let donations = state.store.list(limit, offset).await?;

    Ok(Json(DonationListResponse {
        donations,
        limit,
        offset,
    }))
}
