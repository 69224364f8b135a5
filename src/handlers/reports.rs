use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct StaleQuery {
    pub older_than_hours: Option<i64>,
}

/// Read-only report of pending donations older than the cutoff. Nothing is
/// mutated; the report exists so an operator can chase abandoned attempts.
pub async fn stale_donations(
    State(state): State<AppState>,
    Query(query): Query<StaleQuery>,
) -> Result<impl IntoResponse, AppError> {
    let older_than_hours = query.older_than_hours.unwrap_or(24).max(0);
    let report = state.reconciliation.stale_pending(older_than_hours).await?;
    Ok(Json(report))
}
