//! Command-line interface.

use std::path::PathBuf;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgAction, Parser};
use prt_engine::RunConfig;

use crate::logging::LogFormat;

/// Parallel batch ray tracer.
#[derive(Parser, Debug)]
#[command(name = "prt", version, about, long_about = None)]
pub struct Cli {
    /// Number of worker threads, in [1, 64]
    #[arg(short = 'p', value_name = "N", default_value_t = 1)]
    pub workers: usize,

    /// Global memory size in megabytes
    #[arg(short = 'm', value_name = "MB", default_value_t = 32)]
    pub megabytes: usize,

    /// Antialiasing samples per pixel
    #[arg(short = 'a', value_name = "N", default_value_t = 1)]
    pub samples: u32,

    /// Report elapsed time for every worker
    #[arg(short = 's')]
    pub stats: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', action = ArgAction::Count)]
    pub verbose: u8,

    /// Log output format: pretty, compact, json
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Scene environment file
    #[arg(value_name = "ENVFILE")]
    pub envfile: PathBuf,
}

impl Cli {
    /// The run configuration selected by the options.
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            workers: self.workers,
            arena_megabytes: self.megabytes,
            samples_per_pixel: self.samples,
            per_worker_stats: self.stats,
        }
    }

    /// Parameter banner printed before rendering.
    pub fn banner(&self) -> String {
        let config = self.run_config();
        format!(
            "Number of processors:     {}\n\
             Global memory size:       {} MB\n\
             Samples per pixel:        {}{}\n\
             Per-process statistics:   {}\n\
             Environment file:         {}",
            config.workers,
            config.arena_megabytes,
            config.samples_per_pixel,
            if config.antialiasing() { " (antialiasing)" } else { "" },
            if config.per_worker_stats { "on" } else { "off" },
            self.envfile.display(),
        )
    }
}

/// What to do with a command line clap refused.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Help or version was requested; clap prints it and we exit 0.
    Informational,
    /// A usage error, already formatted as the message after `prt: `.
    Usage(String),
}

/// Classify a clap parse error.
pub fn classify(err: &clap::Error) -> ParseOutcome {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ParseOutcome::Informational,
        ErrorKind::UnknownArgument => {
            let arg = match err.get(ContextKind::InvalidArg) {
                Some(ContextValue::String(arg)) => arg.clone(),
                _ => String::from("?"),
            };
            ParseOutcome::Usage(format!("Invalid option '{arg}'"))
        }
        _ => {
            let rendered = err.to_string();
            let first = rendered.lines().next().unwrap_or_default();
            let message = first.strip_prefix("error: ").unwrap_or(first);
            ParseOutcome::Usage(message.trim_end_matches('.').to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("prt").chain(args.iter().copied()))
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = parse(&["scene.env"]).unwrap();
        assert_eq!(cli.run_config(), RunConfig::default());
        assert_eq!(cli.envfile, PathBuf::from("scene.env"));
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.log_format, None);
    }

    #[test]
    fn short_options() {
        let cli = parse(&["-p", "4", "-m", "72", "-a", "8", "-s", "-vv", "scene.env"]).unwrap();
        let config = cli.run_config();
        assert_eq!(config.workers, 4);
        assert_eq!(config.arena_megabytes, 72);
        assert_eq!(config.samples_per_pixel, 8);
        assert!(config.per_worker_stats);
        assert_eq!(cli.verbose, 2);
        assert!(cli.banner().contains("(antialiasing)"));
    }

    #[test]
    fn log_format_option() {
        let cli = parse(&["--log-format", "json", "scene.env"]).unwrap();
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(parse(&["--log-format", "xml", "scene.env"]).is_err());
    }

    #[test]
    fn unknown_option_is_invalid_option() {
        let err = parse(&["-x", "scene.env"]).unwrap_err();
        assert_eq!(
            classify(&err),
            ParseOutcome::Usage("Invalid option '-x'".into())
        );
    }

    #[test]
    fn help_and_version_are_informational() {
        assert_eq!(classify(&parse(&["-h"]).unwrap_err()), ParseOutcome::Informational);
        assert_eq!(
            classify(&parse(&["--version"]).unwrap_err()),
            ParseOutcome::Informational
        );
    }

    #[test]
    fn other_errors_keep_clap_message() {
        let err = parse(&["-p", "many", "scene.env"]).unwrap_err();
        match classify(&err) {
            ParseOutcome::Usage(msg) => {
                assert!(msg.contains("many"), "{msg}");
                assert!(!msg.starts_with("error:"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = parse(&[]).unwrap_err();
        assert!(matches!(classify(&err), ParseOutcome::Usage(_)));
    }
}
