//! Logger construction
//!
//! A [`Logger`] pairs a logger name with its own `tracing` dispatcher.
//! Nothing is installed globally; code that should log through a logger
//! runs inside [`Logger::scope`].

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::{debug, Dispatch};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::logging::{LogConfig, ResolvedLogger, Sink};
use crate::config::BenchmarkConfig;
use crate::{Result, DEBUG_LOGGER};

pub mod format;

use format::PatternFormat;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Named logger with its own dispatcher
#[derive(Debug, Clone)]
pub struct Logger {
    name: String,
    dispatch: Dispatch,
}

impl Logger {
    /// Wrap an existing dispatcher
    pub fn new(name: impl Into<String>, dispatch: Dispatch) -> Self {
        Self {
            name: name.into(),
            dispatch,
        }
    }

    /// Logger used when no logging configuration file is available.
    ///
    /// Writes to stderr at `info`, or `debug` in debug mode. `RUST_LOG`
    /// overrides the level outside debug mode.
    pub fn fallback(name: impl Into<String>, debug: bool) -> Self {
        let filter = if debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        };
        let subscriber = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .with_target(false)
            .finish();
        Self::new(name, Dispatch::new(subscriber))
    }

    /// Build a logger from a resolved configuration entry
    pub fn from_resolved(resolved: &ResolvedLogger) -> Result<Self> {
        let mut layers: Vec<BoxedLayer> = Vec::with_capacity(resolved.handlers.len());

        for handler in &resolved.handlers {
            let format = PatternFormat::new(
                resolved.name.clone(),
                handler.pattern.clone(),
                handler.datefmt.clone(),
            );
            let layer = match &handler.sink {
                Sink::Stdout => fmt::layer()
                    .with_ansi(false)
                    .event_format(format)
                    .with_writer(std::io::stdout)
                    .with_filter(handler.level)
                    .boxed(),
                Sink::Stderr => fmt::layer()
                    .with_ansi(false)
                    .event_format(format)
                    .with_writer(std::io::stderr)
                    .with_filter(handler.level)
                    .boxed(),
                Sink::File { path, append } => fmt::layer()
                    .with_ansi(false)
                    .event_format(format)
                    .with_writer(Mutex::new(open_log_file(path, *append)?))
                    .with_filter(handler.level)
                    .boxed(),
                Sink::Null => continue,
            };
            layers.push(layer);
        }

        let subscriber = tracing_subscriber::registry()
            .with(layers)
            .with(resolved.level);
        Ok(Self::new(resolved.name.clone(), Dispatch::new(subscriber)))
    }

    /// Logger name as selected at startup
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `f` with this logger receiving all `tracing` events
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

fn open_log_file(path: &Path, append: bool) -> Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    Ok(file)
}

/// Select and build the logger for this run.
///
/// Without an existing logging configuration file the fallback logger is
/// returned. Otherwise the file is parsed and the "debug" logger (debug
/// mode) or the logger named by `use_logger` is built from it.
pub fn init_logger(config: &BenchmarkConfig) -> Result<Logger> {
    let name = if config.debug {
        DEBUG_LOGGER
    } else {
        config.use_logger.as_str()
    };

    let path = match &config.log_config {
        Some(path) if path.is_file() => path,
        _ => return Ok(Logger::fallback(name, config.debug)),
    };

    let log_config = LogConfig::load(path)?;
    let logger = Logger::from_resolved(&log_config.resolve(name)?)?;
    logger.scope(|| debug!("Logger initialized"));
    Ok(logger)
}
