//! Configuration management module
//!
//! Holds the immutable run parameters and the search order for the
//! logging configuration file.

use std::path::{Path, PathBuf};
use crate::{IoPerfError, Result, BITS_PER_GIB, DEFAULT_LOGGER, LOG_CONFIG_DIR, LOG_CONFIG_FILE};

pub mod logging;

pub use logging::LogConfig;

/// Benchmark configuration structure containing all run parameters
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkConfig {
    /// Directory that receives the temporary data file
    pub output_dir: PathBuf,
    /// Number of measurements to take
    pub repeat: u32,
    /// Size of the test data in GiB
    pub data_size_gib: u64,
    /// Switch to the "debug" logger
    pub debug: bool,
    /// Name of the logger to use when not in debug mode
    pub use_logger: String,
    /// JSON logging configuration, `None` when no file was found
    pub log_config: Option<PathBuf>,
    /// Leave the data file on disk after each iteration
    pub keep_temp_files: bool,
}

impl BenchmarkConfig {
    /// Create a configuration with default values for the given output directory
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            repeat: 10,
            data_size_gib: 4,
            debug: false,
            use_logger: DEFAULT_LOGGER.to_string(),
            log_config: default_log_config_path(),
            keep_temp_files: false,
        }
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.repeat == 0 {
            return Err(IoPerfError::GenerationError(
                "Repeat count must be greater than 0".to_string()
            ));
        }

        if self.data_size_gib == 0 {
            return Err(IoPerfError::GenerationError(
                "Data size must be greater than 0 GiB".to_string()
            ));
        }

        if self.data_size_gib.checked_mul(BITS_PER_GIB).is_none() {
            return Err(IoPerfError::GenerationError(
                format!("Data size too large: {} GiB", self.data_size_gib)
            ));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(IoPerfError::ConfigError(
                "Output folder must not be empty".to_string()
            ));
        }

        Ok(())
    }

    /// Number of `f64` values generated per iteration.
    ///
    /// The requested size is expressed in bits and divided by the bit width
    /// of one `f64`, so the buffer occupies exactly `data_size_gib` GiB.
    pub fn element_count(&self) -> u64 {
        self.data_size_gib * BITS_PER_GIB / 64
    }

    /// Set the number of measurements
    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }

    /// Set the data size in GiB
    pub fn with_data_size_gib(mut self, size: u64) -> Self {
        self.data_size_gib = size;
        self
    }

    /// Enable or disable the debug logger
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the logger name used outside debug mode
    pub fn with_logger(mut self, name: impl Into<String>) -> Self {
        self.use_logger = name.into();
        self
    }

    /// Set the logging configuration file
    pub fn with_log_config(mut self, path: Option<PathBuf>) -> Self {
        self.log_config = path;
        self
    }

    /// Set whether to keep the data file
    pub fn with_keep_temp_files(mut self, keep: bool) -> Self {
        self.keep_temp_files = keep;
        self
    }
}

/// Locate `configs/log_config.json` relative to the running executable.
pub fn default_log_config_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let exe = exe.canonicalize().unwrap_or(exe);
    resolve_log_config(exe.parent()?)
}

/// Search `<dir>/configs/log_config.json`, then one directory up.
pub fn resolve_log_config(dir: &Path) -> Option<PathBuf> {
    let candidate = dir.join(LOG_CONFIG_DIR).join(LOG_CONFIG_FILE);
    if candidate.is_file() {
        return Some(candidate);
    }

    let candidate = dir.parent()?.join(LOG_CONFIG_DIR).join(LOG_CONFIG_FILE);
    if candidate.is_file() {
        return Some(candidate);
    }

    None
}
