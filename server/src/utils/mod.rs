//! Utility functions for the application

pub mod time;
pub mod url;
