//! Domain logic
//!
//! - `source` - reading the seat counter from the registration page
//! - `seats` - snapshot orchestration and history

pub mod seats;
pub mod source;

pub use seats::{Sample, SeatService, SeatSettings, Snapshot, SnapshotError};
pub use source::{ScrapeError, SeatSource};
