//! io-perf - sequential disk write benchmark
//!
//! Generates a block of random `f64` values, writes it to a temporary
//! `.npy` file, times the write, deletes the file and repeats. Timing and
//! throughput samples are summarized as min/mean/median/max.

use std::fmt;

pub mod bench;
pub mod cli;
pub mod config;
pub mod io;
pub mod logging;
pub mod models;
pub mod util;

// Common error types
#[derive(Debug)]
pub enum IoPerfError {
    /// I/O operation failed
    IoError(std::io::Error),
    /// Command line or logging configuration error
    ConfigError(String),
    /// Logging configuration file is not valid JSON
    LogConfigParse(serde_json::Error),
    /// Degenerate run parameters or samples
    GenerationError(String),
    /// Array could not be encoded to or decoded from `.npy`
    SerializationError(String),
}

impl fmt::Display for IoPerfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoPerfError::IoError(err) => write!(f, "I/O error: {}", err),
            IoPerfError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            IoPerfError::LogConfigParse(err) => write!(f, "Invalid log config JSON: {}", err),
            IoPerfError::GenerationError(msg) => write!(f, "Generation error: {}", msg),
            IoPerfError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for IoPerfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IoPerfError::IoError(err) => Some(err),
            IoPerfError::LogConfigParse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IoPerfError {
    fn from(err: std::io::Error) -> Self {
        IoPerfError::IoError(err)
    }
}

impl From<serde_json::Error> for IoPerfError {
    fn from(err: serde_json::Error) -> Self {
        IoPerfError::LogConfigParse(err)
    }
}

impl From<ndarray_npy::WriteNpyError> for IoPerfError {
    fn from(err: ndarray_npy::WriteNpyError) -> Self {
        match err {
            ndarray_npy::WriteNpyError::Io(io_err) => IoPerfError::IoError(io_err),
            other => IoPerfError::SerializationError(other.to_string()),
        }
    }
}

impl From<ndarray_npy::ReadNpyError> for IoPerfError {
    fn from(err: ndarray_npy::ReadNpyError) -> Self {
        match err {
            ndarray_npy::ReadNpyError::Io(io_err) => IoPerfError::IoError(io_err),
            other => IoPerfError::SerializationError(other.to_string()),
        }
    }
}

/// Result type alias for io-perf operations
pub type Result<T> = std::result::Result<T, IoPerfError>;

/// Error reporting helpers used by the binary
pub mod error {
    use std::error::Error;
    use std::fmt::Write;

    /// Render the error followed by each of its sources, one per line.
    pub fn render_chain(error: &(dyn Error + 'static)) -> String {
        let mut out = String::from("Error chain:\n");
        let mut current = Some(error);
        let mut depth = 0;
        while let Some(err) = current {
            let _ = writeln!(out, "  {}: {}", depth, err);
            current = err.source();
            depth += 1;
        }
        out
    }

    /// Process exit code for a failed run
    pub const FAILURE_EXIT_CODE: u8 = 1;

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::IoPerfError;

        #[test]
        fn test_render_chain_includes_sources() {
            let err = IoPerfError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "no write access",
            ));
            let rendered = render_chain(&err);
            assert!(rendered.starts_with("Error chain:"));
            assert!(rendered.contains("0: I/O error: no write access"));
            assert!(rendered.contains("1: no write access"));
        }

        #[test]
        fn test_render_chain_single_error() {
            let err = IoPerfError::ConfigError("missing --output-folder".to_string());
            let rendered = render_chain(&err);
            assert_eq!(rendered.lines().count(), 2);
        }
    }
}

// Common types and constants
pub const APP_NAME: &str = "io-perf";
pub const TEMP_FILE_PREFIX: &str = "tmp_io-perf";
pub const TEMP_FILE_EXTENSION: &str = "npy";
pub const LOG_CONFIG_DIR: &str = "configs";
pub const LOG_CONFIG_FILE: &str = "log_config.json";
pub const DEBUG_LOGGER: &str = "debug";
pub const DEFAULT_LOGGER: &str = "default";
pub const BITS_PER_GIB: u64 = 1024 * 1024 * 1024 * 8;
