//! prt - parallel batch ray tracer.

use std::process::ExitCode;

use clap::Parser;
use prt::backend::FlatShade;
use prt::cli::{classify, Cli, ParseOutcome};
use prt::engine::run;
use prt::logging::{self, LogConfig};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            return match classify(&err) {
                ParseOutcome::Informational => {
                    let _ = err.print();
                    ExitCode::SUCCESS
                }
                ParseOutcome::Usage(message) => {
                    eprintln!("prt: {message}.");
                    ExitCode::FAILURE
                }
            };
        }
    };

    let mut log = LogConfig::from_verbosity(cli.verbose);
    if let Some(format) = cli.log_format {
        log = log.with_format(format);
    }
    logging::init(log.with_env_overrides(cli.log_format.is_some()));

    let config = cli.run_config();
    if let Err(err) = config.validate() {
        eprintln!("prt: {err}.");
        return ExitCode::FAILURE;
    }

    println!("{}", cli.banner());
    let mut backend = FlatShade::new();
    match run(&config, &cli.envfile, &mut backend) {
        Ok(report) => {
            println!(
                "Number of primitive objects:  {}\nNumber of primitive elements: {}",
                report.geometry.objects, report.geometry.elements
            );
            print!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("prt: {err}.");
            ExitCode::FAILURE
        }
    }
}
