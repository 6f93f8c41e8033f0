mod api;
mod cli;
mod config;
mod telegram;
mod tui;
mod wizard;

use std::fs::OpenOptions;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use env_logger::{Env, Target};

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.global.verbose, cli.is_interactive()) {
        eprintln!("{} {:#}", "Warning:".yellow(), e);
    }

    if let Err(e) = cli::run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
/// The interactive wizard owns the terminal, so it logs to a file.
fn init_logging(verbose: bool, to_file: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(level));
    builder.format_timestamp_millis();

    if to_file {
        let path = Config::log_path();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(Target::Pipe(Box::new(file)));
    } else if !verbose && std::env::var_os("RUST_LOG").is_none() {
        // Plain commands print their own output; keep stderr for problems
        builder.filter_level(log::LevelFilter::Warn);
    }

    builder.try_init().context("Failed to initialize logger")
}
