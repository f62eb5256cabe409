//! Utility functions module
//!
//! Unit conversions, rounding and host lookup.

pub mod host;
pub mod units;

// Re-export commonly used functions
pub use host::hostname;
pub use units::{bytes_to_megabytes, calculate_throughput_mbps, round2};
