//! Interactive wizard

use std::sync::Arc;

use anyhow::Result;
use colored::*;

use crate::cli::{AppContext, GlobalArgs};
use crate::config::Config;
use crate::telegram::{AccessDenied, check_access};
use crate::tui::{self, Outcome};
use crate::wizard::UserDraft;

pub async fn handle_run_command(global: &GlobalArgs) -> Result<()> {
    let context = AppContext::load(global)?;
    let session = context.session()?;

    let config = &context.config;
    if let Err(denied) = check_access(&session, config.debug, &config.telegram.bot_username) {
        print_access_denied(&denied);
        anyhow::bail!("Access denied: {}", denied.reason);
    }

    let backend = Arc::new(context.backend(&session)?);
    let wizard = context.wizard(&session)?;

    log::info!(
        "Starting wizard for user {:?} ({}) against {}",
        session.telegram_id,
        session.source.label(),
        backend.base_url()
    );

    let (outcome, wizard) = tui::run(wizard, backend).await?;

    match outcome {
        Outcome::Closed => println!("{}", "Wizard closed.".dimmed()),
        Outcome::Quit => println!("{}", "Wizard exited.".dimmed()),
    }
    print_profile(wizard.draft());
    println!(
        "{}",
        format!("Log: {}", Config::log_path().display()).dimmed()
    );
    Ok(())
}

fn print_access_denied(denied: &AccessDenied) {
    eprintln!("{}", "Access restricted".red().bold());
    eprintln!();
    eprintln!("This app can only be used through the Telegram bot.");
    eprintln!("Reason: {}", denied.reason);
    eprintln!("Open {}", denied.bot_link().cyan().underline());
    eprintln!();
    eprintln!(
        "{}",
        "Pass --init-data, set TELEGRAM_INIT_DATA, or use --debug for local testing.".dimmed()
    );
}

pub(crate) fn print_profile(draft: &UserDraft) {
    let show = |value: &str| {
        if value.is_empty() {
            "-".dimmed().to_string()
        } else {
            value.bright_green().to_string()
        }
    };
    println!("  Name: {}", show(&draft.name));
    println!("  City: {}", show(&draft.town));
}
