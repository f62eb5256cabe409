//! Measurement samples and summary statistics

use tracing::info;

use crate::logging::Logger;
use crate::util::units::round2;
use crate::{IoPerfError, Result};

/// Per-iteration measurements in recording order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Samples {
    timings: Vec<f64>,
    throughputs: Vec<f64>,
}

impl Samples {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            timings: Vec::with_capacity(capacity),
            throughputs: Vec::with_capacity(capacity),
        }
    }

    /// Record one iteration: seconds spent writing and resulting MB/s
    pub fn record(&mut self, elapsed_secs: f64, throughput_mbps: f64) {
        self.timings.push(elapsed_secs);
        self.throughputs.push(throughput_mbps);
    }

    /// Elapsed write time per iteration, in seconds
    pub fn timings(&self) -> &[f64] {
        &self.timings
    }

    /// Throughput per iteration, in MB/s
    pub fn throughputs(&self) -> &[f64] {
        &self.throughputs
    }

    pub fn len(&self) -> usize {
        self.timings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }
}

/// Min/mean/median/max of one sample sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub min: f64,
    pub mean: f64,
    pub median: f64,
    pub max: f64,
}

impl Summary {
    /// Summarize `values` after rounding each to two decimals.
    ///
    /// The median of an even count is the mean of the two middle values.
    /// All four results are rounded to two decimals as well.
    pub fn from_samples(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(IoPerfError::GenerationError(
                "Cannot summarize an empty sample sequence".to_string(),
            ));
        }

        let mut sorted: Vec<f64> = values.iter().copied().map(round2).collect();
        sorted.sort_by(f64::total_cmp);

        let len = sorted.len();
        let mean = sorted.iter().sum::<f64>() / len as f64;
        let median = if len % 2 == 0 {
            (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
        } else {
            sorted[len / 2]
        };

        Ok(Self {
            min: sorted[0],
            mean: round2(mean),
            median: round2(median),
            max: sorted[len - 1],
        })
    }
}

/// Summaries for both timing and throughput samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsReport {
    pub timings: Summary,
    pub throughput: Summary,
}

impl StatsReport {
    pub fn from_samples(samples: &Samples) -> Result<Self> {
        Ok(Self {
            timings: Summary::from_samples(samples.timings())?,
            throughput: Summary::from_samples(samples.throughputs())?,
        })
    }

    /// Report lines in output order
    pub fn lines(&self) -> Vec<String> {
        let t = &self.timings;
        let s = &self.throughput;
        vec![
            "Timings in seconds between I/O start and end".to_string(),
            format!("Min.: {:.2} s", t.min),
            format!("Avg.: {:.2} s", t.mean),
            format!("Median: {:.2} s", t.median),
            format!("Max.: {:.2} s", t.max),
            "======================".to_string(),
            "Write speed in MB/sec".to_string(),
            format!("Min.: {:.2} MB/s", s.min),
            format!("Avg.: {:.2} MB/s", s.mean),
            format!("Median: {:.2} MB/s", s.median),
            format!("Max.: {:.2} MB/s", s.max),
        ]
    }

    /// Emit the report at info level through `logger`
    pub fn log(&self, logger: &Logger) {
        logger.scope(|| {
            for line in self.lines() {
                info!("{}", line);
            }
        });
    }
}
