//! Headless run of the wizard's input steps

use anyhow::{Context, Result, anyhow};
use colored::*;

use super::run::print_profile;
use crate::api::UserBackend;
use crate::cli::{AppContext, GlobalArgs};
use crate::telegram::check_access;
use crate::wizard::{Effect, Field, Msg, WizardController};

#[derive(Debug, Clone, clap::Args)]
pub struct ApplyArgs {
    /// Name to save; defaults to the one stored on the backend
    #[arg(long)]
    pub name: Option<String>,

    /// City to save; defaults to the one stored on the backend
    #[arg(long)]
    pub town: Option<String>,
}

impl ApplyArgs {
    fn value(&self, field: Field) -> Option<&str> {
        match field {
            Field::Name => self.name.as_deref(),
            Field::Town => self.town.as_deref(),
        }
    }
}

pub async fn handle_apply_command(global: &GlobalArgs, args: ApplyArgs) -> Result<()> {
    let context = AppContext::load(global)?;
    let session = context.session()?;
    check_access(&session, context.config.debug, &context.config.telegram.bot_username)?;

    let backend = context.backend(&session)?;
    println!("Backend: {}", backend.base_url().cyan());

    let mut controller = WizardController::new(context.wizard(&session)?, backend);
    for effect in controller.initialize().await {
        if let Effect::Notify(text) = effect {
            println!("{}", text);
        }
    }
    if controller.wizard().state().backend_healthy == Some(false) {
        println!("{}", "Warning: backend health check failed".yellow());
    }

    let saved = submit_input_steps(&mut controller, &args).await?;
    println!(
        "{} {} field(s) saved, now at step {}/{}",
        "Done:".green().bold(),
        saved,
        controller.position() + 1,
        controller.wizard().course().len()
    );
    print_profile(controller.draft());
    Ok(())
}

/// Press the save button of every input block from the current one on,
/// stopping at the first plain block. Values not given on the command line fall back to the
/// restored profile. Returns how many fields were saved.
pub async fn submit_input_steps<B: UserBackend>(
    controller: &mut WizardController<B>,
    args: &ApplyArgs,
) -> Result<usize> {
    let mut saved = 0;

    while let Some(field) = controller.current_block().kind.field() {
        let value = args
            .value(field)
            .map(str::to_string)
            .or_else(|| {
                let stored = controller.draft().get(field);
                (!stored.is_empty()).then(|| stored.to_string())
            })
            .with_context(|| format!("--{} is required: no {} is stored for this user", field, field))?;

        let action = controller
            .current_block()
            .buttons
            .iter()
            .map(|button| button.action)
            .find(|action| action.submitted_field() == Some(field))
            .with_context(|| format!("The {} step has no save button", field))?;

        let position = controller.position();
        controller.dispatch(Msg::InputChanged(value.clone())).await;
        controller
            .handle_action(action)
            .await
            .map_err(|e| anyhow!("Could not save {}: {}", field, e.user_message()))?;

        println!("  {} {} = {}", "✓".green(), field, value.trim().bright_white());
        saved += 1;

        if controller.position() == position {
            break;
        }
    }

    Ok(saved)
}
