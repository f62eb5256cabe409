//! Logging configuration document
//!
//! Parses the JSON dictionary-style logging configuration (`version`,
//! `formatters`, `handlers`, `loggers`, `root`) into explicit types and
//! resolves a named logger to its effective level and sinks. Keys that are
//! not modelled here are ignored.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::level_filters::LevelFilter;

use crate::logging::format::Pattern;
use crate::{IoPerfError, Result, DEBUG_LOGGER};

const SUPPORTED_VERSION: u64 = 1;
const DEFAULT_FORMAT: &str = "%(message)s";

/// Top-level logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Schema version, only `1` is accepted
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub formatters: HashMap<String, FormatterSpec>,
    #[serde(default)]
    pub handlers: HashMap<String, HandlerSpec>,
    #[serde(default)]
    pub loggers: HashMap<String, LoggerSpec>,
    #[serde(default)]
    pub root: Option<LoggerSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormatterSpec {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub datefmt: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandlerSpec {
    pub class: String,
    #[serde(default)]
    pub level: Option<LevelSpec>,
    #[serde(default)]
    pub formatter: Option<String>,
    /// `ext://sys.stdout` or `ext://sys.stderr`
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub filename: Option<PathBuf>,
    /// `a` (append, default) or `w` (truncate)
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggerSpec {
    #[serde(default)]
    pub level: Option<LevelSpec>,
    #[serde(default)]
    pub handlers: Vec<String>,
    #[serde(default)]
    pub propagate: Option<bool>,
}

/// Level given either by name (`"INFO"`) or by number (`20`)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LevelSpec {
    Name(String),
    Number(u64),
}

impl LevelSpec {
    /// Threshold for this level, `None` for `NOTSET`.
    pub fn to_filter(&self) -> Result<Option<LevelFilter>> {
        match self {
            LevelSpec::Name(name) => match name.trim().to_ascii_uppercase().as_str() {
                "NOTSET" => Ok(None),
                "TRACE" => Ok(Some(LevelFilter::TRACE)),
                "DEBUG" => Ok(Some(LevelFilter::DEBUG)),
                "INFO" => Ok(Some(LevelFilter::INFO)),
                "WARNING" | "WARN" => Ok(Some(LevelFilter::WARN)),
                "ERROR" | "CRITICAL" | "FATAL" => Ok(Some(LevelFilter::ERROR)),
                _ => Err(IoPerfError::ConfigError(format!("Unknown log level: {}", name))),
            },
            LevelSpec::Number(0) => Ok(None),
            LevelSpec::Number(n) => Ok(Some(match *n {
                1..=9 => LevelFilter::TRACE,
                10 => LevelFilter::DEBUG,
                11..=20 => LevelFilter::INFO,
                21..=30 => LevelFilter::WARN,
                _ => LevelFilter::ERROR,
            })),
        }
    }
}

/// Destination of a handler
#[derive(Debug, Clone, PartialEq)]
pub enum Sink {
    Stdout,
    Stderr,
    File { path: PathBuf, append: bool },
    Null,
}

/// Handler with its references resolved
#[derive(Debug, Clone)]
pub struct ResolvedHandler {
    pub name: String,
    pub sink: Sink,
    pub level: LevelFilter,
    pub pattern: Pattern,
    pub datefmt: Option<String>,
}

/// Logger with inherited level and propagated handlers resolved
#[derive(Debug, Clone)]
pub struct ResolvedLogger {
    pub name: String,
    pub level: LevelFilter,
    pub handlers: Vec<ResolvedHandler>,
}

impl LogConfig {
    /// Read and parse a logging configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|err| match err {
            IoPerfError::ConfigError(msg) => {
                IoPerfError::ConfigError(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Parse a logging configuration document.
    ///
    /// A logger named "debug" must be defined, whether or not debug mode is
    /// requested.
    pub fn parse(content: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(content)?;

        let has_debug_logger = document
            .get("loggers")
            .and_then(Value::as_object)
            .map_or(false, |loggers| loggers.contains_key(DEBUG_LOGGER));
        if !has_debug_logger {
            return Err(IoPerfError::ConfigError(format!(
                "Logger named \"{}\" must be present in log config JSON",
                DEBUG_LOGGER
            )));
        }

        let config: Self = serde_json::from_value(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration schema
    pub fn validate(&self) -> Result<()> {
        match self.version {
            Some(SUPPORTED_VERSION) => {}
            Some(other) => {
                return Err(IoPerfError::ConfigError(format!(
                    "Unsupported log config version: {}",
                    other
                )))
            }
            None => {
                return Err(IoPerfError::ConfigError(
                    "Log config does not specify a version".to_string(),
                ))
            }
        }

        for (name, formatter) in &self.formatters {
            self.build_formatter(name, formatter)?;
        }

        for (name, handler) in &self.handlers {
            self.resolve_handler(name, handler)?;
        }

        for spec in self.loggers.values().chain(self.root.iter()) {
            if let Some(level) = &spec.level {
                level.to_filter()?;
            }
        }

        Ok(())
    }

    /// Resolve a logger by name.
    ///
    /// Names that are not listed under `loggers` fall back to `root`, or to
    /// an empty root at `WARNING` when the document has none. A logger that
    /// ends up without any handler writes `WARNING` and above to stderr.
    pub fn resolve(&self, name: &str) -> Result<ResolvedLogger> {
        let implicit_root = LoggerSpec::default();
        let (spec, is_root) = match self.loggers.get(name) {
            Some(spec) => (spec, false),
            None => (self.root.as_ref().unwrap_or(&implicit_root), true),
        };

        let root_level = match &self.root {
            Some(root) => root.level.as_ref().map(LevelSpec::to_filter).transpose()?.flatten(),
            None => None,
        };
        let own_level = spec.level.as_ref().map(LevelSpec::to_filter).transpose()?.flatten();
        let level = own_level.or(root_level).unwrap_or(LevelFilter::WARN);

        let mut handler_names: Vec<&String> = spec.handlers.iter().collect();
        if !is_root && spec.propagate.unwrap_or(true) {
            if let Some(root) = &self.root {
                handler_names.extend(root.handlers.iter());
            }
        }

        let mut handlers = Vec::with_capacity(handler_names.len());
        for handler_name in handler_names {
            let handler = self.handlers.get(handler_name).ok_or_else(|| {
                IoPerfError::ConfigError(format!("Unknown handler: {}", handler_name))
            })?;
            handlers.push(self.resolve_handler(handler_name, handler)?);
        }
        if handlers.is_empty() {
            handlers.push(last_resort_handler()?);
        }

        Ok(ResolvedLogger {
            name: name.to_string(),
            level,
            handlers,
        })
    }

    fn resolve_handler(&self, name: &str, handler: &HandlerSpec) -> Result<ResolvedHandler> {
        let sink = match handler.class.as_str() {
            "logging.StreamHandler" => match handler.stream.as_deref() {
                None | Some("ext://sys.stderr") => Sink::Stderr,
                Some("ext://sys.stdout") => Sink::Stdout,
                Some(other) => {
                    return Err(IoPerfError::ConfigError(format!(
                        "Unsupported stream for handler {}: {}",
                        name, other
                    )))
                }
            },
            "logging.FileHandler"
            | "logging.handlers.RotatingFileHandler"
            | "logging.handlers.TimedRotatingFileHandler"
            | "logging.handlers.WatchedFileHandler" => {
                let path = handler.filename.clone().ok_or_else(|| {
                    IoPerfError::ConfigError(format!("Handler {} requires a filename", name))
                })?;
                let append = match handler.mode.as_deref() {
                    None | Some("a") => true,
                    Some("w") => false,
                    Some(other) => {
                        return Err(IoPerfError::ConfigError(format!(
                            "Unsupported file mode for handler {}: {}",
                            name, other
                        )))
                    }
                };
                Sink::File { path, append }
            }
            "logging.NullHandler" => Sink::Null,
            other => {
                return Err(IoPerfError::ConfigError(format!(
                    "Unsupported handler class for {}: {}",
                    name, other
                )))
            }
        };

        let level = match &handler.level {
            Some(level) => level.to_filter()?.unwrap_or(LevelFilter::TRACE),
            None => LevelFilter::TRACE,
        };

        let (pattern, datefmt) = match &handler.formatter {
            Some(formatter_name) => {
                let formatter = self.formatters.get(formatter_name).ok_or_else(|| {
                    IoPerfError::ConfigError(format!("Unknown formatter: {}", formatter_name))
                })?;
                self.build_formatter(formatter_name, formatter)?
            }
            None => (Pattern::parse(DEFAULT_FORMAT).map_err(IoPerfError::ConfigError)?, None),
        };

        Ok(ResolvedHandler {
            name: name.to_string(),
            sink,
            level,
            pattern,
            datefmt,
        })
    }

    fn build_formatter(
        &self,
        name: &str,
        formatter: &FormatterSpec,
    ) -> Result<(Pattern, Option<String>)> {
        let pattern = Pattern::parse(formatter.format.as_deref().unwrap_or(DEFAULT_FORMAT))
            .map_err(|msg| IoPerfError::ConfigError(format!("Formatter {}: {}", name, msg)))?;

        if let Some(datefmt) = &formatter.datefmt {
            let invalid = chrono::format::StrftimeItems::new(datefmt)
                .any(|item| matches!(item, chrono::format::Item::Error));
            if invalid {
                return Err(IoPerfError::ConfigError(format!(
                    "Formatter {}: invalid datefmt {:?}",
                    name, datefmt
                )));
            }
        }

        Ok((pattern, formatter.datefmt.clone()))
    }
}

/// Stderr handler used when a logger has no handlers of its own
fn last_resort_handler() -> Result<ResolvedHandler> {
    Ok(ResolvedHandler {
        name: "lastResort".to_string(),
        sink: Sink::Stderr,
        level: LevelFilter::WARN,
        pattern: Pattern::parse(DEFAULT_FORMAT).map_err(IoPerfError::ConfigError)?,
        datefmt: None,
    })
}
