//! Terminal front end of the wizard
//!
//! Elm-style loop: the view renders from state, key presses and backend
//! replies become [`Msg`](crate::wizard::Msg)s for the wizard core, and the
//! effects it returns are run on spawned tasks.

pub mod app;
pub mod input;
pub mod view;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::api::UserBackend;
use crate::wizard::Wizard;

pub use app::{App, Outcome};

const TICK_RATE: Duration = Duration::from_millis(120);

/// Take over the terminal and run the wizard until the user quits or
/// backs out of the first block. Returns the wizard as it was left.
pub async fn run<B: UserBackend + 'static>(
    wizard: Wizard,
    backend: Arc<B>,
) -> Result<(Outcome, Wizard)> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e).context("Failed to enter alternate screen");
    }

    let result = match Terminal::new(CrosstermBackend::new(stdout)) {
        Ok(mut terminal) => {
            let mut app = App::new(wizard, backend);
            let outcome = app.run(&mut terminal, TICK_RATE).await;
            let _ = terminal.show_cursor();
            outcome
                .map(|outcome| (outcome, app.into_wizard()))
                .context("Terminal I/O failed")
        }
        Err(e) => Err(e).context("Failed to initialize terminal"),
    };

    restore_terminal();
    result
}

fn restore_terminal() {
    if let Err(e) = disable_raw_mode() {
        log::error!("Failed to disable raw mode: {}", e);
    }
    if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen) {
        log::error!("Failed to leave alternate screen: {}", e);
    }
}
