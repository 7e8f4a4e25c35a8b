//! Shared infrastructure used across the monitor: error types and console logging.

pub mod error;
pub mod logging;
