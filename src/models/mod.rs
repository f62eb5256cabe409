//! Data models module
//!
//! Measurement samples and their summary statistics.

pub mod stats;

// Re-export commonly used types
pub use stats::{Samples, StatsReport, Summary};
