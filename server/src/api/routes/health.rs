//! Health check endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::data::series::SeriesService;

#[derive(Clone)]
pub struct HealthApiState {
    pub series: Arc<SeriesService>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub fn routes(series: Arc<SeriesService>) -> Router<()> {
    Router::new()
        .route("/health", get(health))
        .with_state(HealthApiState { series })
}

/// Health check endpoint
///
/// Reports `unavailable` with 503 when the history store does not answer.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "History store unreachable", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<HealthApiState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, label) = match state.series.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, backend = state.series.backend_name(), "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };
    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
