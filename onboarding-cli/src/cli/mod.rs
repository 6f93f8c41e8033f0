//! Command line interface

pub mod commands;
pub mod context;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use context::AppContext;

#[derive(Debug, Parser)]
#[command(name = "onboarding", version, about = "Onboarding wizard for the Smoky Bot Telegram Mini App")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Flags shared by every command. They override the config file and the
/// environment.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct GlobalArgs {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Debug mode: no Telegram access check, temporary user id when none is known
    #[arg(long, global = true)]
    pub debug: bool,

    /// Raw Telegram init data as passed to the Mini App
    #[arg(long, global = true, value_name = "QUERY")]
    pub init_data: Option<String>,

    /// Telegram user id, overriding the one in the init data
    #[arg(long, global = true, value_name = "ID")]
    pub telegram_id: Option<i64>,

    /// Telegram username, overriding the one in the init data
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Course file (TOML) to use instead of the built-in course
    #[arg(long, global = true, value_name = "PATH")]
    pub course: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the interactive wizard (default)
    Run,
    /// Submit name and city without the interactive UI
    Apply(commands::apply::ApplyArgs),
    /// Check the backend health endpoint
    Health,
    /// Show the Telegram session the wizard would run with
    Session(commands::session::SessionArgs),
    /// Print the course blocks
    Course(commands::course::CourseArgs),
    /// Manage the configuration file
    #[command(subcommand)]
    Config(commands::config::ConfigCommands),
}

impl Cli {
    /// Whether the command takes over the terminal
    pub fn is_interactive(&self) -> bool {
        matches!(self.command, None | Some(Commands::Run))
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    if cli.global.no_color {
        colored::control::set_override(false);
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::handle_run_command(&cli.global).await,
        Commands::Apply(args) => commands::apply::handle_apply_command(&cli.global, args).await,
        Commands::Health => commands::health::handle_health_command(&cli.global).await,
        Commands::Session(args) => commands::session::handle_session_command(&cli.global, args),
        Commands::Course(args) => commands::course::handle_course_command(&cli.global, args),
        Commands::Config(command) => commands::config::handle_config_command(&cli.global, command),
    }
}
