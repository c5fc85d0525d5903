use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use sldraft_cli::Args;

fn main() {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!("Starting sldraft (log level {})", log_level);
    debug!("Parsed arguments: {:?}", args);

    match sldraft_cli::run(&args) {
        Ok(report) => info!(
            "Completed: {} of {} steps applied",
            report.succeeded(),
            report.steps
        ),
        Err(err) => {
            error!("Failed: {}", err);
            process::exit(1);
        }
    }
}
