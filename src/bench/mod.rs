//! Benchmark engine module
//!
//! Runs the write loop and reports the collected statistics.

pub mod sequential;

// Re-export commonly used types
pub use sequential::{generate_buffer, WriteBenchmark};

use crate::config::BenchmarkConfig;
use crate::logging::Logger;
use crate::models::StatsReport;
use crate::Result;

/// Run the benchmark described by `config` and log the summary.
pub fn run(config: BenchmarkConfig, logger: &Logger) -> Result<StatsReport> {
    let samples = WriteBenchmark::new(config)?.run(logger)?;
    let report = StatsReport::from_samples(&samples)?;
    report.log(logger);
    Ok(report)
}
