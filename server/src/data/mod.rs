//! Data storage layer
//!
//! - `series` - bounded seat history (Redis or in-memory)

pub mod series;

pub use series::{BoundedSeries, SeriesError, SeriesService};
