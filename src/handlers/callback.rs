use crate::services::{CallbackParams, CallbackState};
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct CallbackQuery {
    pub reference: Option<String>,
    pub trxref: Option<String>,
    pub method: Option<String>,
}

/// Entry point the provider redirects back to after an external payment
/// flow. Performs exactly one verification attempt and returns the terminal
/// state; the page renders the outcome and offers a manual retry on failure.
#[utoipa::path(
    get,
    path = "/donations/callback",
    params(CallbackQuery),
    responses(
        (status = 200, description = "Terminal verification state")
    ),
    tag = "Donations"
)]
pub async fn donation_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> impl IntoResponse {
    let params = CallbackParams {
        reference: query.reference,
        trxref: query.trxref,
        method: query.method,
    };

    let outcome: CallbackState = state.callback.resolve(&params).await;
    Json(outcome)
}
