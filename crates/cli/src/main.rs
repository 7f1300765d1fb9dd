//! Sightline CLI - Main Entry Point
//!
//! Inspects baseline libraries the way the engine resolves them and
//! manages engine configuration files.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use sightline::Config;
use sightline_cli::commands::{baselines, config};
use sightline_cli::output;

/// Sightline - image-driven UI entity resolution
#[derive(Parser)]
#[command(name = "sightline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "sightline.toml", env = "SIGHTLINE_CONFIG", global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect baseline libraries
    #[command(subcommand)]
    Baselines(baselines::BaselineCommands),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Baselines(cmd) => {
            let settings = Config::load(&cli.config)
                .with_context(|| format!("Failed to load {}", cli.config.display()))?;
            baselines::execute(cmd, &settings, cli.format)?
        }
        Commands::Config(cmd) => config::execute(cmd, &cli.config, cli.format)?,
        Commands::Version => {
            println!("Sightline CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
