//! Seat data types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One recorded reading of seats taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Sample {
    /// Epoch milliseconds at which the reading was recorded
    pub timestamp: i64,
    /// Seats taken at that moment
    pub seats: u32,
}

/// Current reading plus the retained history, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Snapshot {
    pub current: u32,
    pub history: Vec<Sample>,
}

/// Public settings the dashboard needs to render and poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SeatSettings {
    pub total_seats: u32,
    pub max_data_points: usize,
    pub poll_interval_ms: u64,
}
