use anyhow::Context;
use bp_squeeze::cli::{Args, Commands};
use bp_squeeze::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_PROBE_TIMEOUT, DEFAULT_TOLERANCE_FLOOR};
use bp_squeeze::info::{print_seed_estimate, print_source_info};
use bp_squeeze::logger::Logger;
use bp_squeeze::pipeline::{generate_breakpoints, Backend, GenerateOptions};
use bp_squeeze::SearchConfig;
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;

fn main() -> ExitCode {
    let args = Args::parse();
    let logger = Logger::new(args.command.verbosity());

    match run(args.command, &logger) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            logger.error(format!("Error: {:#}", err));
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, logger: &Logger) -> anyhow::Result<()> {
    match command {
        Commands::Generate {
            source,
            step,
            lower,
            upper,
            output_dir,
            tolerance,
            max_attempts,
            timeout,
            quality,
            backend,
            ..
        } => {
            let search = SearchConfig::with_limits(
                step,
                tolerance.unwrap_or(DEFAULT_TOLERANCE_FLOOR),
                max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            )?;
            let options = GenerateOptions {
                source,
                lower,
                upper,
                output_dir,
                search,
                quality,
                backend: backend.parse::<Backend>()?,
                timeout: probe_timeout(timeout),
            };

            let summary = generate_breakpoints(&options, logger).with_context(|| {
                format!("failed to generate breakpoints for {:?}", options.source)
            })?;
            logger.info(summary.report(&options.output_dir));
        }
        Commands::Info {
            input,
            lower,
            upper,
            step,
            backend,
        } => {
            let source = print_source_info(&input)?;
            if let (Some(lower), Some(step)) = (lower, step) {
                let step = SearchConfig::new(step)?.step();
                print_seed_estimate(&source, lower, upper, step, backend.parse()?)
                    .context("failed to estimate the seed growth factor")?;
            }
        }
    }

    Ok(())
}

fn probe_timeout(seconds: Option<u64>) -> Option<Duration> {
    match seconds {
        None => Some(DEFAULT_PROBE_TIMEOUT),
        Some(0) => None,
        Some(seconds) => Some(Duration::from_secs(seconds)),
    }
}
