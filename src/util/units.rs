//! Unit conversion helpers
//!
//! Sizes, throughput and rounding of reported values.

use std::time::Duration;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Convert bytes to megabytes (bytes / 1024 / 1024)
///
/// # Examples
/// ```
/// use io_perf::util::units::bytes_to_megabytes;
///
/// assert_eq!(bytes_to_megabytes(1048576), 1.0);
/// assert_eq!(bytes_to_megabytes(524288), 0.5);
/// ```
pub fn bytes_to_megabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Throughput in MB/s, `None` when the duration is zero
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use io_perf::util::units::calculate_throughput_mbps;
///
/// let throughput = calculate_throughput_mbps(1048576, Duration::from_secs(1)).unwrap();
/// assert!((throughput - 1.0).abs() < 0.01);
/// assert!(calculate_throughput_mbps(1048576, Duration::ZERO).is_none());
/// ```
pub fn calculate_throughput_mbps(bytes: u64, duration: Duration) -> Option<f64> {
    if duration.is_zero() {
        return None;
    }

    Some(bytes_to_megabytes(bytes) / duration.as_secs_f64())
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
