mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use common::log_setup::{setup_logging, shutdown_logging};
use seamfield::{Config, FieldGenerator, GeneratedFiles};

use crate::cli::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(&cli.log_level, &cli.log_dir) {
        eprintln!("failed to set up logging: {}", e);
        return ExitCode::FAILURE;
    }

    let status = match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    };

    shutdown_logging();
    status
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);

    let mut generator = FieldGenerator::new(config).context("invalid configuration")?;

    let files = match cli.command {
        Command::Mask { west, east, .. } => generator
            .generate_mask(&west, &east)
            .with_context(|| {
                format!(
                    "failed to generate mask from {} and {}",
                    west.display(),
                    east.display()
                )
            })?,
        Command::Distance {
            west,
            east,
            precision,
            ..
        } => generator
            .generate_distance_field(&west, &east, precision.into())
            .with_context(|| {
                format!(
                    "failed to generate distance field from {} and {}",
                    west.display(),
                    east.display()
                )
            })?,
    };

    report(&files);

    Ok(())
}

fn report(files: &GeneratedFiles) {
    if let Some(report) = &files.report {
        for pass in &report.passes {
            tracing::info!(
                "{} pass: {} iterations, {}",
                pass.direction,
                pass.iterations,
                if pass.converged {
                    "converged"
                } else {
                    "stopped at the ceiling"
                }
            );
        }
    }

    for path in &files.paths {
        tracing::info!("Wrote {}", path.display());
    }
}
