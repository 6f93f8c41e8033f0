//! Inspect the Telegram session

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::*;

use crate::cli::{AppContext, GlobalArgs};
use crate::telegram::{InitData, check_access};

#[derive(Debug, Clone, clap::Args)]
pub struct SessionArgs {
    /// Verify the init data signature with this bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,
}

pub fn handle_session_command(global: &GlobalArgs, args: SessionArgs) -> Result<()> {
    let context = AppContext::load(global)?;
    let config = &context.config;
    let session = context.session()?;

    println!("{}", "Session".bold());
    match session.telegram_id {
        Some(id) => println!("  User id:  {} ({})", id.to_string().bright_green(), session.source.label()),
        None => println!("  User id:  {}", "none".red()),
    }
    println!(
        "  Username: {}",
        session.username.as_deref().unwrap_or("-")
    );
    println!("  Debug:    {}", config.debug);

    if session.init_data.is_empty() {
        println!("  Init data: {}", "none".dimmed());
    } else {
        let data = InitData::parse(&session.init_data).context("Invalid Telegram init data")?;
        if let Some(auth_date) = data.auth_date() {
            println!("  Signed:   {}", format_auth_date(auth_date));
        }
        if let Some(query_id) = data.query_id() {
            println!("  Query id: {}", query_id);
        }
        if let Some(user) = &data.user {
            let full_name = [user.first_name.as_deref(), user.last_name.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            if !full_name.is_empty() {
                println!("  Name:     {}", full_name);
            }
            if user.is_premium {
                println!("  Premium:  yes");
            }
        }

        if let Some(token) = &args.bot_token {
            match data.verify(token) {
                Ok(()) => println!("  Signature: {}", "valid".green().bold()),
                Err(e) => println!("  Signature: {} ({})", "invalid".red().bold(), e),
            }
        }
    }

    println!();
    match check_access(&session, config.debug, &config.telegram.bot_username) {
        Ok(()) => println!("{}", "Access granted".green()),
        Err(denied) => println!("{}", denied.to_string().red()),
    }
    Ok(())
}

fn format_auth_date(seconds: i64) -> String {
    match DateTime::<Utc>::from_timestamp(seconds, 0) {
        Some(at) => {
            let age = Utc::now().signed_duration_since(at);
            format!("{} ({} h ago)", at.format("%Y-%m-%d %H:%M:%S UTC"), age.num_hours())
        }
        None => seconds.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_auth_date() {
        assert!(format_auth_date(1662771648).starts_with("2022-09-10 01:00:48 UTC"));
        assert_eq!(format_auth_date(i64::MAX), i64::MAX.to_string());
    }
}
