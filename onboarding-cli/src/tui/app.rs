use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;

use super::input::TextInput;
use super::view;
use crate::api::UserBackend;
use crate::wizard::{ActionId, Block, Effect, Msg, Wizard, perform};

/// Events flowing through the event loop
#[derive(Debug)]
pub enum AppEvent {
    /// Periodic tick for the saving indicator
    Tick,
    /// Raw terminal input
    Input(Event),
    /// Result of a backend call, addressed to the wizard core
    Wizard(Msg),
}

/// What a key press means in the current context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Edit(KeyCode),
    Trigger(ActionId),
    FocusNext,
    FocusPrev,
    HostBack,
    DismissNotice,
}

/// Why the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Ctrl+C
    Quit,
    /// Back was pressed on the first block; the host would close the app
    Closed,
}

/// Map a key press to an action.
///
/// On input blocks the arrows move the text cursor and `Enter` fires the
/// block's first button. On plain blocks `Tab` and the arrows move the
/// button focus and `Enter` fires the focused button.
pub fn map_key(key: KeyEvent, block: &Block, focused: usize, notice_open: bool) -> Option<KeyAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl {
        return match key.code {
            KeyCode::Char('c') => Some(KeyAction::Quit),
            KeyCode::Char('n') => Some(KeyAction::Trigger(ActionId::Next)),
            KeyCode::Char('p') => Some(KeyAction::Trigger(ActionId::Prev)),
            _ => None,
        };
    }

    if notice_open {
        return match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Some(KeyAction::DismissNotice),
            _ => None,
        };
    }

    let editing = block.kind.field().is_some();
    match key.code {
        KeyCode::Esc => Some(KeyAction::HostBack),
        KeyCode::PageDown => Some(KeyAction::Trigger(ActionId::Next)),
        KeyCode::PageUp => Some(KeyAction::Trigger(ActionId::Prev)),
        KeyCode::Enter if editing => block.primary_action().map(KeyAction::Trigger),
        KeyCode::Enter => block
            .buttons
            .get(focused)
            .map(|button| KeyAction::Trigger(button.action)),
        KeyCode::Tab | KeyCode::Right | KeyCode::Down if !editing => Some(KeyAction::FocusNext),
        KeyCode::BackTab | KeyCode::Left | KeyCode::Up if !editing => Some(KeyAction::FocusPrev),
        code if editing => Some(KeyAction::Edit(code)),
        _ => None,
    }
}

/// Wizard plus the terminal-side state that is not the core's business
pub struct App<B> {
    pub(super) wizard: Wizard,
    pub(super) input: TextInput,
    /// Focused button on plain blocks
    pub(super) focused: usize,
    pub(super) ticks: u64,
    /// Backend calls spawned and not yet answered
    pub(super) pending: usize,
    running: bool,
    outcome: Outcome,
    backend: Arc<B>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl<B: UserBackend + 'static> App<B> {
    pub fn new(wizard: Wizard, backend: Arc<B>) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut app = Self {
            wizard,
            input: TextInput::new(),
            focused: 0,
            ticks: 0,
            pending: 0,
            running: true,
            outcome: Outcome::Quit,
            backend,
            event_tx,
            event_rx,
        };
        app.sync_input();
        app
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn into_wizard(self) -> Wizard {
        self.wizard
    }

    /// Main loop: render, wait for the next event, update
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        tick_rate: Duration,
    ) -> io::Result<Outcome> {
        let mut tick_interval = tokio::time::interval(tick_rate);
        let mut event_stream = EventStream::new();

        self.dispatch(Msg::Init);

        while self.running {
            terminal.draw(|frame| view::render(frame, self))?;

            tokio::select! {
                _ = tick_interval.tick() => {
                    self.handle_event(AppEvent::Tick);
                }
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                }
                Some(Ok(crossterm_event)) = event_stream.next() => {
                    self.handle_event(AppEvent::Input(crossterm_event));
                }
            }
        }

        Ok(self.outcome)
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Tick => self.ticks = self.ticks.wrapping_add(1),
            AppEvent::Input(Event::Key(key)) => {
                let notice_open = self.wizard.state().notice.is_some();
                if let Some(action) =
                    map_key(key, self.wizard.current_block(), self.focused, notice_open)
                {
                    self.handle_key_action(action);
                }
            }
            AppEvent::Input(_) => {}
            AppEvent::Wizard(msg) => {
                self.pending = self.pending.saturating_sub(1);
                self.dispatch(msg);
            }
        }
    }

    fn handle_key_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::Quit => {
                self.outcome = Outcome::Quit;
                self.running = false;
            }
            KeyAction::Edit(code) => {
                if self.input.handle_key(code) {
                    self.dispatch(Msg::InputChanged(self.input.value().to_string()));
                }
            }
            KeyAction::Trigger(action) => self.dispatch(Msg::Action(action)),
            KeyAction::FocusNext => {
                let count = self.wizard.current_block().buttons.len();
                if count > 0 {
                    self.focused = (self.focused + 1) % count;
                }
            }
            KeyAction::FocusPrev => {
                let count = self.wizard.current_block().buttons.len();
                if count > 0 {
                    self.focused = (self.focused + count - 1) % count;
                }
            }
            KeyAction::HostBack => self.dispatch(Msg::HostBack),
            KeyAction::DismissNotice => self.dispatch(Msg::DismissNotice),
        }
    }

    /// Feed `msg` to the core and act on the effects it returns
    fn dispatch(&mut self, msg: Msg) {
        let position = self.wizard.position();

        for effect in self.wizard.update(msg) {
            match effect {
                Effect::Close => {
                    log::info!("Back on the first block, closing");
                    self.outcome = Outcome::Closed;
                    self.running = false;
                }
                Effect::Notify(text) => log::info!("Notice: {}", text),
                io => self.spawn(io),
            }
        }

        if self.wizard.position() != position {
            self.focused = 0;
        }
        self.sync_input();
    }

    /// Run a backend effect off the loop; its result comes back as an event
    fn spawn(&mut self, effect: Effect) {
        self.pending += 1;
        let backend = Arc::clone(&self.backend);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            if let Some(msg) = perform(backend.as_ref(), effect).await {
                // The receiver is gone only once the loop has exited
                let _ = tx.send(AppEvent::Wizard(msg));
            }
        });
    }

    /// Mirror the core's input text into the text widget after the core
    /// replaced it (block change, restored profile value).
    fn sync_input(&mut self) {
        let text = &self.wizard.state().input;
        if self.input.value() == text {
            return;
        }
        let text = text.clone();
        self.input.set_value(&text);
        if self.input.value() != text {
            // Truncated to the input limit
            self.wizard
                .update(Msg::InputChanged(self.input.value().to_string()));
        }
    }

    #[cfg(test)]
    async fn next_backend_reply(&mut self) {
        if let Some(event) = self.event_rx.recv().await {
            self.handle_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::RemoteUser;
    use crate::api::{CreateUserRequest, HealthStatus, SyncError, UpsertUserResponse, UserPatch};
    use crate::wizard::{Course, ServerDefaults, UserDraft};
    use async_trait::async_trait;

    struct StubBackend {
        stored: RemoteUser,
        patch_status: Option<u16>,
    }

    #[async_trait]
    impl UserBackend for StubBackend {
        async fn upsert_user(
            &self,
            _request: &CreateUserRequest,
        ) -> Result<UpsertUserResponse, SyncError> {
            Ok(UpsertUserResponse {
                success: true,
                message: None,
                user: Some(self.stored.clone()),
                created: false,
            })
        }

        async fn patch_user(&self, _telegram_id: i64, _patch: &UserPatch) -> Result<(), SyncError> {
            match self.patch_status {
                Some(status) => Err(SyncError::from_status(status, "")),
                None => Ok(()),
            }
        }

        async fn health(&self) -> Result<HealthStatus, SyncError> {
            Err(SyncError::Unreachable("down".into()))
        }
    }

    fn app(stored: RemoteUser, patch_status: Option<u16>) -> App<StubBackend> {
        let wizard = Wizard::new(
            Course::builtin().unwrap(),
            UserDraft::new(Some(1), None),
            ServerDefaults::default(),
        );
        App::new(wizard, Arc::new(StubBackend { stored, patch_status }))
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Input(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn ctrl(c: char) -> AppEvent {
        AppEvent::Input(Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)))
    }

    fn type_text(app: &mut App<StubBackend>, text: &str) {
        for c in text.chars() {
            app.handle_event(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_map_key_on_input_block() {
        let course = Course::builtin().unwrap();
        let block = &course.blocks()[0];
        let press = |code| KeyEvent::new(code, KeyModifiers::NONE);

        assert_eq!(
            map_key(press(KeyCode::Enter), block, 0, false),
            Some(KeyAction::Trigger(ActionId::SubmitName))
        );
        assert_eq!(
            map_key(press(KeyCode::Left), block, 0, false),
            Some(KeyAction::Edit(KeyCode::Left))
        );
        assert_eq!(map_key(press(KeyCode::Esc), block, 0, false), Some(KeyAction::HostBack));
        assert_eq!(
            map_key(press(KeyCode::Enter), block, 0, true),
            Some(KeyAction::DismissNotice)
        );
    }

    #[test]
    fn test_map_key_on_plain_block() {
        let course = Course::builtin().unwrap();
        let block = &course.blocks()[2];
        let press = |code| KeyEvent::new(code, KeyModifiers::NONE);

        assert_eq!(map_key(press(KeyCode::Tab), block, 0, false), Some(KeyAction::FocusNext));
        assert_eq!(map_key(press(KeyCode::Left), block, 1, false), Some(KeyAction::FocusPrev));
        assert_eq!(
            map_key(press(KeyCode::Enter), block, 1, false),
            Some(KeyAction::Trigger(ActionId::Settings))
        );
        assert_eq!(map_key(press(KeyCode::Char('x')), block, 0, false), None);
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), block, 0, false),
            Some(KeyAction::Quit)
        );
    }

    #[tokio::test]
    async fn test_submit_round_trip_through_spawned_task() {
        let mut app = app(RemoteUser::default(), None);

        type_text(&mut app, "Alex");
        assert_eq!(app.wizard().state().input, "Alex");

        app.handle_event(key(KeyCode::Enter));
        assert!(app.wizard().state().is_submitting());
        assert_eq!(app.pending, 1);

        app.next_backend_reply().await;
        assert_eq!(app.wizard().position(), 1);
        assert_eq!(app.wizard().draft().name, "Alex");
        assert_eq!(app.input.value(), "");
        assert_eq!(app.pending, 0);
    }

    #[tokio::test]
    async fn test_failed_submit_stays_and_shows_error() {
        let mut app = app(RemoteUser::default(), Some(404));

        type_text(&mut app, "Alex");
        app.handle_event(key(KeyCode::Enter));
        app.next_backend_reply().await;

        assert_eq!(app.wizard().position(), 0);
        assert_eq!(
            app.wizard().state().field_error.as_deref(),
            Some("User not found. Restart the app.")
        );
        assert_eq!(app.input.value(), "Alex");
    }

    #[tokio::test]
    async fn test_init_prefills_input_from_profile() {
        let mut app = app(
            RemoteUser {
                name: Some("Alex".into()),
                ..RemoteUser::default()
            },
            None,
        );

        app.dispatch(Msg::Init);
        assert_eq!(app.pending, 2);
        app.next_backend_reply().await;
        app.next_backend_reply().await;

        assert_eq!(app.wizard().draft().name, "Alex");
        assert_eq!(app.input.value(), "Alex");
        assert_eq!(app.wizard().state().backend_healthy, Some(false));
    }

    #[tokio::test]
    async fn test_navigation_and_close() {
        let mut app = app(RemoteUser::default(), None);

        app.handle_event(ctrl('n'));
        app.handle_event(ctrl('n'));
        assert_eq!(app.wizard().position(), 2);

        app.handle_event(key(KeyCode::Tab));
        assert_eq!(app.focused, 1);
        app.handle_event(key(KeyCode::Enter));
        assert_eq!(app.wizard().state().notice.as_deref(), Some("User settings"));

        app.handle_event(key(KeyCode::Esc));
        assert!(app.wizard().state().notice.is_none());
        assert_eq!(app.wizard().position(), 2);

        app.handle_event(key(KeyCode::Esc));
        assert_eq!(app.wizard().position(), 1);
        assert_eq!(app.focused, 0);
        app.handle_event(key(KeyCode::PageUp));
        assert!(app.running);
        app.handle_event(key(KeyCode::Esc));
        assert!(!app.running);
        assert_eq!(app.outcome, Outcome::Closed);
    }
}
