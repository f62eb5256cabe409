//! Sequential write benchmark
//!
//! Each iteration generates a fresh buffer of random `f64` values, writes
//! it to the same temporary `.npy` file, times only the write, and deletes
//! the file again before the next iteration.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use ndarray::Array1;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::BenchmarkConfig;
use crate::io::{payload_bytes, temp_file_path, write_array, TempFile};
use crate::logging::Logger;
use crate::models::Samples;
use crate::util::{bytes_to_megabytes, calculate_throughput_mbps, hostname};
use crate::{IoPerfError, Result};

/// Sequential write benchmark executor
pub struct WriteBenchmark {
    config: BenchmarkConfig,
    element_count: usize,
}

impl WriteBenchmark {
    /// Create a benchmark for a validated configuration
    pub fn new(config: BenchmarkConfig) -> Result<Self> {
        config.validate()?;

        let element_count = usize::try_from(config.element_count()).map_err(|_| {
            IoPerfError::GenerationError(format!(
                "Data size of {} GiB does not fit in memory on this platform",
                config.data_size_gib
            ))
        })?;

        Ok(Self {
            config,
            element_count,
        })
    }

    /// Override the number of values generated per iteration
    pub fn with_element_count(mut self, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(IoPerfError::GenerationError(
                "Element count must be greater than 0".to_string(),
            ));
        }
        self.element_count = count;
        Ok(self)
    }

    /// Number of values generated per iteration
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Run all iterations, logging through `logger`
    pub fn run(&self, logger: &Logger) -> Result<Samples> {
        logger.scope(|| self.execute())
    }

    fn execute(&self) -> Result<Samples> {
        debug!("Starting performance test");
        fs::create_dir_all(&self.config.output_dir)?;

        let hostname = hostname()?;
        let mut rng = SmallRng::from_entropy();
        let file_path = temp_file_path(&self.config.output_dir, &hostname, &mut rng);

        info!("Running on host: {}", hostname);
        info!("Writing temp data to file: {}", file_path.display());
        info!("Repeating measurements {} times", self.config.repeat);
        debug!("Generating {} random floats per iteration", self.element_count);

        let mut samples = Samples::with_capacity(self.config.repeat as usize);

        for idx in 0..self.config.repeat {
            let data = generate_buffer(self.element_count, &mut rng);
            let data_size_bytes = payload_bytes(&data);
            let data_size_mbytes = bytes_to_megabytes(data_size_bytes);
            debug!(
                "Iteration {}: random data of size {} B (~ {} MB) generated",
                idx + 1,
                data_size_bytes,
                data_size_mbytes
            );

            debug!("Writing data...");
            let elapsed = self.write_once(&file_path, &data)?;

            let throughput = calculate_throughput_mbps(data_size_bytes, elapsed).ok_or_else(|| {
                IoPerfError::GenerationError(format!(
                    "Write of {:.2} MB completed in zero measurable time",
                    data_size_mbytes
                ))
            })?;
            samples.record(elapsed.as_secs_f64(), throughput);

            debug!("Iter complete");
        }

        Ok(samples)
    }

    /// Write `data` to `path` and return the time spent in the write.
    ///
    /// The timed region starts after the file is opened and ends after the
    /// buffered data is flushed and the handle is closed.
    fn write_once(&self, path: &Path, data: &Array1<f64>) -> Result<Duration> {
        let mut temp_file = TempFile::create(path)?;
        if self.config.keep_temp_files {
            temp_file.keep_on_drop();
        }

        let start = Instant::now();
        write_array(temp_file.file_mut()?, data)?;
        temp_file.close();
        let elapsed = start.elapsed();

        if !self.config.keep_temp_files {
            temp_file.remove()?;
        }

        Ok(elapsed)
    }
}

/// Buffer of `count` values drawn uniformly from `[0, 1)`
pub fn generate_buffer<R: Rng>(count: usize, rng: &mut R) -> Array1<f64> {
    Array1::from_shape_simple_fn(count, || rng.gen::<f64>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_array;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;
    use tracing::level_filters::LevelFilter;
    use tracing::Dispatch;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_logger() -> (Logger, Capture) {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(LevelFilter::DEBUG)
            .with_ansi(false)
            .finish();
        (Logger::new("debug", Dispatch::new(subscriber)), capture)
    }

    fn dir_entries(path: &Path) -> Vec<std::path::PathBuf> {
        fs::read_dir(path)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[test]
    fn test_sample_count_matches_repeat() {
        let temp_dir = tempdir().unwrap();
        let (logger, _) = capture_logger();

        for repeat in [1u32, 3, 5] {
            let config = BenchmarkConfig::new(temp_dir.path()).with_repeat(repeat);
            let benchmark = WriteBenchmark::new(config).unwrap().with_element_count(4096).unwrap();
            let samples = benchmark.run(&logger).unwrap();

            assert_eq!(samples.len(), repeat as usize);
            assert_eq!(samples.timings().len(), repeat as usize);
            assert_eq!(samples.throughputs().len(), repeat as usize);
            assert!(samples.timings().iter().all(|&t| t > 0.0));
            assert!(samples.throughputs().iter().all(|&s| s > 0.0 && s.is_finite()));
        }

        assert!(dir_entries(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_missing_output_dir_is_created() {
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().join("nested").join("out");
        let (logger, _) = capture_logger();

        let config = BenchmarkConfig::new(&output_dir).with_repeat(2);
        let benchmark = WriteBenchmark::new(config).unwrap().with_element_count(128).unwrap();
        let samples = benchmark.run(&logger).unwrap();

        assert_eq!(samples.len(), 2);
        assert!(output_dir.is_dir());
        assert!(dir_entries(&output_dir).is_empty());
    }

    #[test]
    fn test_kept_file_reads_back() {
        let temp_dir = tempdir().unwrap();
        let (logger, _) = capture_logger();

        let config = BenchmarkConfig::new(temp_dir.path())
            .with_repeat(2)
            .with_keep_temp_files(true);
        let benchmark = WriteBenchmark::new(config).unwrap().with_element_count(1000).unwrap();
        benchmark.run(&logger).unwrap();

        let files = dir_entries(temp_dir.path());
        assert_eq!(files.len(), 1);
        let restored = read_array(&files[0]).unwrap();
        assert_eq!(restored.len(), 1000);
        assert!(restored.iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn test_write_once_round_trip_and_size() {
        let temp_dir = tempdir().unwrap();
        let config = BenchmarkConfig::new(temp_dir.path()).with_keep_temp_files(true);
        let benchmark = WriteBenchmark::new(config).unwrap();

        let mut rng = SmallRng::seed_from_u64(42);
        let data = generate_buffer(2048, &mut rng);
        let path = temp_dir.path().join("round_trip.npy");

        let elapsed = benchmark.write_once(&path, &data).unwrap();
        assert!(elapsed > Duration::ZERO);

        let on_disk = fs::metadata(&path).unwrap().len();
        assert!(on_disk > payload_bytes(&data));
        assert!(on_disk - payload_bytes(&data) < 256);

        let restored = read_array(&path).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn test_write_once_deletes_file() {
        let temp_dir = tempdir().unwrap();
        let config = BenchmarkConfig::new(temp_dir.path());
        let benchmark = WriteBenchmark::new(config).unwrap();

        let mut rng = SmallRng::seed_from_u64(3);
        let data = generate_buffer(16, &mut rng);
        let path = temp_dir.path().join("gone.npy");

        benchmark.write_once(&path, &data).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_output_dir_that_is_a_file_fails() {
        let temp_dir = tempdir().unwrap();
        let blocker = temp_dir.path().join("not_a_dir");
        fs::write(&blocker, b"x").unwrap();
        let (logger, _) = capture_logger();

        let config = BenchmarkConfig::new(&blocker).with_repeat(1);
        let benchmark = WriteBenchmark::new(config).unwrap().with_element_count(8).unwrap();
        assert!(matches!(benchmark.run(&logger), Err(IoPerfError::IoError(_))));
    }

    #[test]
    fn test_progress_is_logged() {
        let temp_dir = tempdir().unwrap();
        let (logger, capture) = capture_logger();

        let config = BenchmarkConfig::new(temp_dir.path()).with_repeat(3);
        let benchmark = WriteBenchmark::new(config).unwrap().with_element_count(64).unwrap();
        benchmark.run(&logger).unwrap();

        let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Starting performance test"));
        assert!(output.contains("Running on host: "));
        assert!(output.contains("tmp_io-perf_"));
        assert!(output.contains("Repeating measurements 3 times"));
        assert!(output.contains("Generating 64 random floats per iteration"));
        assert!(output.contains("Iteration 3: random data of size 512 B"));
        assert_eq!(output.matches("Iter complete").count(), 3);
    }

    #[test]
    fn test_zero_element_count_rejected() {
        let config = BenchmarkConfig::new("/tmp/out");
        let benchmark = WriteBenchmark::new(config).unwrap();
        assert!(matches!(
            benchmark.with_element_count(0),
            Err(IoPerfError::GenerationError(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BenchmarkConfig::new("/tmp/out").with_repeat(0);
        assert!(WriteBenchmark::new(config).is_err());
    }

    #[test]
    fn test_default_element_count() {
        let config = BenchmarkConfig::new("/tmp/out").with_data_size_gib(2);
        let benchmark = WriteBenchmark::new(config).unwrap();
        assert_eq!(benchmark.element_count(), 2 * 134_217_728);
    }

    #[test]
    fn test_generate_buffer() {
        let mut rng = SmallRng::seed_from_u64(9);
        let data = generate_buffer(10_000, &mut rng);
        assert_eq!(data.len(), 10_000);
        assert!(data.iter().all(|&v| (0.0..1.0).contains(&v)));

        let other = generate_buffer(10_000, &mut rng);
        assert_ne!(data, other);
    }
}
