//! Logging setup for the prt binary.
//!
//! Logs go to stderr so stdout carries only the banner and the timing
//! report.
//!
//! # Environment Variables
//!
//! - `PRT_LOG` - Log filter (overrides RUST_LOG)
//! - `PRT_LOG_FORMAT` - Output format: pretty, compact, json
//! - `RUST_LOG` - Standard Rust log filter (fallback)
//!
//! Command-line verbosity (`-v`) takes precedence over both filters.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human-readable format.
    Pretty,
    /// Single-line format (default).
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "full" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Unknown log format: '{s}'. Valid options: pretty, compact, json"
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Compact => write!(f, "compact"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base level when no filter is set. Default: WARN.
    pub level: Level,
    /// Output format. Default: compact.
    pub format: LogFormat,
    /// Filter directive, overriding `level`.
    pub filter: Option<String>,
    /// Show thread names, which carry the worker index.
    pub show_thread_names: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            format: LogFormat::Compact,
            filter: None,
            show_thread_names: true,
        }
    }
}

impl LogConfig {
    /// Config for `-v` repeated `verbosity` times.
    ///
    /// Zero keeps the default and leaves the filter to the environment.
    pub fn from_verbosity(verbosity: u8) -> Self {
        let config = Self::default();
        match verbosity {
            0 => config,
            1 => config.with_filter("prt=info".into()),
            2 => config.with_filter("prt=debug".into()),
            _ => config.with_filter("prt=trace".into()),
        }
    }

    /// Set the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set a filter directive.
    pub fn with_filter(mut self, filter: String) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Apply `PRT_LOG`, `RUST_LOG`, and `PRT_LOG_FORMAT`.
    ///
    /// A filter already set (from `-v`) is kept; `format_from_cli` says
    /// whether the format came from the command line and must be kept too.
    pub fn with_env_overrides(mut self, format_from_cli: bool) -> Self {
        if self.filter.is_none() {
            if let Ok(filter) = std::env::var("PRT_LOG") {
                self.filter = Some(filter);
            } else if let Ok(filter) = std::env::var("RUST_LOG") {
                self.filter = Some(filter);
            }
        }
        if !format_from_cli {
            if let Some(format) = std::env::var("PRT_LOG_FORMAT")
                .ok()
                .and_then(|f| f.parse().ok())
            {
                self.format = format;
            }
        }
        self
    }

    fn build_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.to_string().to_lowercase());
        match &self.filter {
            Some(filter) => EnvFilter::try_new(filter).unwrap_or_else(|_| {
                eprintln!("prt: Invalid log filter '{filter}', using default.");
                fallback()
            }),
            None => fallback(),
        }
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(config: LogConfig) {
    let filter = config.build_filter();
    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_thread_names(config.show_thread_names)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .compact()
                    .with_thread_names(config.show_thread_names)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_thread_names(config.show_thread_names)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    let _ = result;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_from_str() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("full".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn verbosity_maps_to_filter() {
        assert_eq!(LogConfig::from_verbosity(0).filter, None);
        assert_eq!(
            LogConfig::from_verbosity(1).filter.as_deref(),
            Some("prt=info")
        );
        assert_eq!(
            LogConfig::from_verbosity(5).filter.as_deref(),
            Some("prt=trace")
        );
    }

    #[test]
    fn cli_filter_survives_env_overrides() {
        let config = LogConfig::from_verbosity(2).with_env_overrides(true);
        assert_eq!(config.filter.as_deref(), Some("prt=debug"));
    }

    #[test]
    fn defaults() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::WARN);
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.show_thread_names);
    }
}
