//! Command line interface
//!
//! Flags keep their historical two-letter short forms (`-ul`, `-lc`, `-of`,
//! `-ds`). clap only accepts single-character shorts, so those are
//! rewritten to their long forms before parsing.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;

use crate::config::{default_log_config_path, BenchmarkConfig};
use crate::{IoPerfError, APP_NAME, DEFAULT_LOGGER};

const MULTI_CHAR_SHORTS: &[(&str, &str)] = &[
    ("-ul", "--use-logger"),
    ("-lc", "--log-config"),
    ("-of", "--output-folder"),
    ("-ds", "--data-size"),
];

/// io-perf - measure sequential disk write throughput
#[derive(Parser, Debug)]
#[command(name = APP_NAME, author, version, about)]
pub struct Cli {
    /// Print progress messages (by default: to stderr)
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Name of logger to use [short: -ul]
    #[arg(long = "use-logger", value_name = "NAME", default_value = DEFAULT_LOGGER)]
    pub use_logger: String,

    /// JSON file with the logger configuration; a logger named "debug"
    /// must be present in it [short: -lc]
    #[arg(long = "log-config", value_name = "FILE")]
    pub log_config: Option<OsString>,

    /// Path to store temp data [short: -of]
    #[arg(long = "output-folder", value_name = "DIR")]
    pub output_folder: PathBuf,

    /// Repeat measurements this many times
    #[arg(short = 'r', long, default_value_t = 10)]
    pub repeat: u32,

    /// Size of the test data file in GiB [short: -ds]
    #[arg(long = "data-size", value_name = "GIB", default_value_t = 4)]
    pub data_size: u64,
}

impl Cli {
    /// Parse from raw arguments, accepting the two-letter short flags
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }

    /// Build the run configuration.
    ///
    /// Without `--log-config` the default search path is used; an empty
    /// value disables the logging configuration file.
    pub fn into_config(self) -> BenchmarkConfig {
        let log_config = match self.log_config {
            Some(path) if path.is_empty() => None,
            Some(path) => Some(PathBuf::from(path)),
            None => default_log_config_path(),
        };

        BenchmarkConfig::new(self.output_folder)
            .with_debug(self.debug)
            .with_logger(self.use_logger)
            .with_log_config(log_config)
            .with_repeat(self.repeat)
            .with_data_size_gib(self.data_size)
    }
}

/// Rewrite two-letter short flags to their long forms.
///
/// Both `-of DIR` and `-of=DIR` are handled. Arguments after `--` are left
/// untouched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;

    for arg in args {
        let arg: OsString = arg.into();
        if passthrough {
            out.push(arg);
            continue;
        }

        let rewritten = arg.to_str().and_then(|text| {
            if text == "--" {
                return None;
            }
            MULTI_CHAR_SHORTS.iter().find_map(|(short, long)| {
                if text == *short {
                    Some(OsString::from(*long))
                } else {
                    text.strip_prefix(short)
                        .and_then(|rest| rest.strip_prefix('='))
                        .map(|value| OsString::from(format!("{}={}", long, value)))
                }
            })
        });

        if arg == "--" {
            passthrough = true;
        }
        out.push(rewritten.unwrap_or(arg));
    }

    out
}

/// Help and version requests are not failures
pub fn is_informational(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}

/// clap's rendered message folded onto one line, usage text dropped
impl From<clap::Error> for IoPerfError {
    fn from(err: clap::Error) -> Self {
        let rendered = err.to_string();
        let message = rendered
            .lines()
            .map(str::trim)
            .take_while(|line| {
                !line.starts_with("Usage:") && !line.starts_with("For more information")
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let message = message.strip_prefix("error: ").unwrap_or(&message);
        IoPerfError::ConfigError(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_args(std::iter::once("io-perf").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["--output-folder", "/tmp/out"]).unwrap();
        assert!(!cli.debug);
        assert_eq!(cli.use_logger, "default");
        assert_eq!(cli.log_config, None);
        assert_eq!(cli.output_folder, PathBuf::from("/tmp/out"));
        assert_eq!(cli.repeat, 10);
        assert_eq!(cli.data_size, 4);
    }

    #[test]
    fn test_short_flags() {
        let cli = parse(&[
            "-d", "-ul", "quiet", "-lc", "/etc/log.json", "-of", "/data", "-r", "3", "-ds", "1",
        ])
        .unwrap();
        assert!(cli.debug);
        assert_eq!(cli.use_logger, "quiet");
        assert_eq!(cli.log_config, Some(OsString::from("/etc/log.json")));
        assert_eq!(cli.output_folder, PathBuf::from("/data"));
        assert_eq!(cli.repeat, 3);
        assert_eq!(cli.data_size, 1);
    }

    #[test]
    fn test_short_flags_with_equals() {
        let cli = parse(&["-of=/data", "-ds=2"]).unwrap();
        assert_eq!(cli.output_folder, PathBuf::from("/data"));
        assert_eq!(cli.data_size, 2);
    }

    #[test]
    fn test_long_flags() {
        let cli = parse(&[
            "--debug",
            "--use-logger=verbose",
            "--log-config",
            "cfg.json",
            "--output-folder=/x",
            "--repeat",
            "7",
            "--data-size",
            "8",
        ])
        .unwrap();
        assert!(cli.debug);
        assert_eq!(cli.use_logger, "verbose");
        assert_eq!(cli.repeat, 7);
        assert_eq!(cli.data_size, 8);
    }

    #[test]
    fn test_missing_output_folder() {
        let err = parse(&["--repeat", "3"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(!is_informational(&err));

        match IoPerfError::from(err) {
            IoPerfError::ConfigError(msg) => {
                assert!(msg.contains("--output-folder"));
                assert!(!msg.contains('\n'));
                assert!(!msg.contains("Usage:"));
            }
            other => panic!("Expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_repeat() {
        assert!(parse(&["-of", "/x", "-r", "many"]).is_err());
        assert!(parse(&["-of", "/x", "-r", "-1"]).is_err());
    }

    #[test]
    fn test_command_name() {
        use clap::CommandFactory;
        assert_eq!(Cli::command().get_name(), APP_NAME);
    }

    #[test]
    fn test_help_is_informational() {
        let err = parse(&["--help"]).unwrap_err();
        assert!(is_informational(&err));
    }

    #[test]
    fn test_normalize_leaves_other_args() {
        let args = normalize_args(["io-perf", "-of", "-r", "--", "-ds"]);
        let args: Vec<&str> = args.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(args, vec!["io-perf", "--output-folder", "-r", "--", "-ds"]);
    }

    #[test]
    fn test_normalize_does_not_touch_lookalikes() {
        let args = normalize_args(["-offset", "-dsx", "--of"]);
        let args: Vec<&str> = args.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(args, vec!["-offset", "-dsx", "--of"]);
    }

    #[test]
    fn test_into_config() {
        let cli = parse(&["-of", "/data", "-r", "3", "-ds", "1", "-lc", "/etc/log.json"]).unwrap();
        let config = cli.into_config();
        assert_eq!(config.output_dir, PathBuf::from("/data"));
        assert_eq!(config.repeat, 3);
        assert_eq!(config.data_size_gib, 1);
        assert_eq!(config.log_config, Some(PathBuf::from("/etc/log.json")));
        assert!(!config.keep_temp_files);
    }

    #[test]
    fn test_empty_log_config_disables_file() {
        let cli = parse(&["-of", "/data", "-lc", ""]).unwrap();
        assert_eq!(cli.into_config().log_config, None);
    }
}
