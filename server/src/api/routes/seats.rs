//! Seat endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::middleware::no_store;
use crate::api::types::{ApiError, ErrorResponse};
use crate::domain::seats::{SeatService, SeatSettings, Snapshot};

#[derive(Clone)]
pub struct SeatsApiState {
    pub seats: Arc<SeatService>,
}

pub fn routes(seats: Arc<SeatService>) -> Router<()> {
    Router::new()
        .route(
            "/seats-snapshot",
            get(get_snapshot).layer(axum::middleware::from_fn(no_store)),
        )
        .route("/seats/settings", get(get_settings))
        .with_state(SeatsApiState { seats })
}

/// Take a fresh reading and return it with the recorded history
///
/// Every call scrapes the registration page and appends one sample.
#[utoipa::path(
    get,
    path = "/api/v1/seats-snapshot",
    tag = "seats",
    responses(
        (status = 200, description = "Current seats taken and history, newest first", body = Snapshot),
        (status = 500, description = "Scrape or history store failure", body = ErrorResponse)
    )
)]
pub async fn get_snapshot(State(state): State<SeatsApiState>) -> Result<Json<Snapshot>, ApiError> {
    let snapshot = state.seats.snapshot().await?;
    Ok(Json(snapshot))
}

/// Capacity, history cap and poll interval for the dashboard
#[utoipa::path(
    get,
    path = "/api/v1/seats/settings",
    tag = "seats",
    responses(
        (status = 200, description = "Seat settings", body = SeatSettings)
    )
)]
pub async fn get_settings(State(state): State<SeatsApiState>) -> Json<SeatSettings> {
    Json(state.seats.settings())
}
