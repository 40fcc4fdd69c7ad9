//! OpenAPI specification

use axum::http::header;
use axum::response::{IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::routes::{health, seats};
use crate::api::types::ErrorResponse;
use crate::domain::seats::{Sample, SeatSettings, Snapshot};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SeatWatch API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Live seat counter for event registrations"
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "seats", description = "Seat readings and history")
    ),
    paths(health::health, seats::get_snapshot, seats::get_settings),
    components(schemas(
        health::HealthResponse,
        Sample,
        Snapshot,
        SeatSettings,
        ErrorResponse
    ))
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}
