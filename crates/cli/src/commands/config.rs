//! Config Commands

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use std::path::Path;

use sightline::Config;

use crate::output::{print_success, render, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a configuration file holding the defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn execute(cmd: ConfigCommands, path: &Path, format: OutputFormat) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let config = Config::load(path).with_context(|| format!("Failed to load {}", path.display()))?;
            match render(&config, format)? {
                Some(rendered) => println!("{rendered}"),
                None => print!("{}", toml::to_string_pretty(&config)?),
            }
        }

        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            Config::default()
                .save(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_success(&format!("Wrote default configuration to {}", path.display()));
        }
    }

    Ok(())
}
