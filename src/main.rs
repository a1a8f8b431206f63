mod bundle;
mod cli;
mod config;
mod demo;
mod display;
mod plan;
mod report;
mod runner;
mod system;

use clap::Parser;
use std::env;
use std::process;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Exit code when at least one check failed
const EXIT_CHECKS_FAILED: i32 = 1;
/// Exit code for usage and configuration errors
const EXIT_USAGE: i32 = 2;

fn main() {
    init_tracing();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            process::exit(EXIT_USAGE);
        }
    };
    process::exit(rt.block_on(async_main()));
}

fn init_tracing() {
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

async fn async_main() -> i32 {
    let cli = cli::Cli::parse();

    // Check for demo mode
    let demo_mode = env::var("DEMO_MODE").unwrap_or_else(|_| "false".to_string()) == "true";

    let mut config = match config::VerifierConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_USAGE;
        }
    };
    cli.apply_to(&mut config);
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return EXIT_USAGE;
    }

    let options = runner::RunOptions {
        json: cli.json,
        list_checks: cli.list_checks,
    };

    match runner::run_with_config(demo_mode, config, options).await {
        Ok(true) => 0,
        Ok(false) => EXIT_CHECKS_FAILED,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_USAGE
        }
    }
}
