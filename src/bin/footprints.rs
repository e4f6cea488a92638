//! Footprints CLI Binary
//!
//! Command-line shipper for the Footprints telemetry pipeline.

use clap::Parser;
use footprints::cli::{exit_code, map_error, Cli, RunContext};
use footprints::config::ConfigLoader;
use footprints::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    // Build logging config from CLI args, env vars, and config file
    let logging_config = build_logging_config(&cli);

    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Footprints CLI starting");

    let context = match RunContext::new(
        cli.root.clone(),
        cli.config.clone(),
        cli.endpoint.clone(),
        cli.debug,
    ) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(exit_code(&e));
        }
    }
}

/// Build logging configuration from CLI args and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let loaded = match cli.config {
        Some(ref config_path) => ConfigLoader::load_from_file(config_path).ok(),
        None => ConfigLoader::load(&cli.root).ok(),
    };
    let debug = cli.debug || loaded.as_ref().is_some_and(|c| c.debug);
    let mut config = loaded.map(|c| c.logging).unwrap_or_default().for_debug(debug);

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
    }

    config
}
