use anyhow::Result;
use clap::Subcommand;
use colored::*;

use crate::cli::{AppContext, GlobalArgs};
use crate::config::Config;

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration (file, environment and flags merged)
    Show,
    /// Write a config file with the default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file location
    Path,
}

pub fn handle_config_command(global: &GlobalArgs, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let context = AppContext::load(global)?;
            println!("{}", format!("# {}", context.config_path.display()).dimmed());
            print!("{}", context.config.to_toml()?);
        }
        ConfigCommands::Init { force } => {
            let path = global.config.clone().unwrap_or_else(Config::path);
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save_to(&path)?;
            println!("{} {}", "Wrote".green(), path.display());
        }
        ConfigCommands::Path => {
            println!("{}", global.config.clone().unwrap_or_else(Config::path).display());
        }
    }
    Ok(())
}
