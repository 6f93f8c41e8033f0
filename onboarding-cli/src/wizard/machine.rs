//! Pure state-transition core of the onboarding wizard
//!
//! [`Wizard::update`] takes a [`Msg`] and returns the [`Effect`]s the caller
//! must perform. No I/O happens here: remote calls come back in as messages,
//! tagged with the [`RequestToken`] they were issued with, and responses whose
//! token is no longer current are dropped.

use serde::{Deserialize, Serialize};

use super::content::{ActionId, Block, Course};
use super::error::{ValidationError, WizardError};
use super::msg::{Effect, Msg, SyncRequest};
use super::state::{Field, Reconciliation, RequestToken, Submission, UserDraft, WizardState};
use crate::api::{SyncError, UpsertUserResponse};

/// Minimum length, in characters, of a submitted value after trimming
pub const MIN_FIELD_LEN: usize = 2;

/// Values the backend assigns to fields nobody has filled in yet.
/// They are never copied into the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerDefaults {
    pub name: String,
    pub town: String,
}

impl Default for ServerDefaults {
    fn default() -> Self {
        Self {
            name: "Друг".to_string(),
            town: "Чудесный город".to_string(),
        }
    }
}

impl ServerDefaults {
    pub fn is_default(&self, field: Field, value: &str) -> bool {
        match field {
            Field::Name => value == self.name,
            Field::Town => value == self.town,
        }
    }
}

const LESSON_NOTICE: &str = "Heading to the lessons! 🚀";
const SETTINGS_NOTICE: &str = "User settings";

#[derive(Debug, Clone)]
pub struct Wizard {
    course: Course,
    state: WizardState,
    server_defaults: ServerDefaults,
}

impl Wizard {
    pub fn new(course: Course, draft: UserDraft, server_defaults: ServerDefaults) -> Self {
        let mut wizard = Self {
            course,
            state: WizardState::new(draft),
            server_defaults,
        };
        wizard.enter_block();
        wizard
    }

    pub fn course(&self) -> &Course {
        &self.course
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn position(&self) -> usize {
        self.state.position
    }

    pub fn draft(&self) -> &UserDraft {
        &self.state.draft
    }

    pub fn current_block(&self) -> &Block {
        &self.course.blocks()[self.state.position]
    }

    /// Title of the current block with the user's name substituted in
    pub fn display_title(&self) -> String {
        self.course
            .display_title(self.state.position, &self.state.draft.name)
    }

    pub fn is_last(&self) -> bool {
        self.state.position == self.course.last_index()
    }

    pub fn update(&mut self, msg: Msg) -> Vec<Effect> {
        log::trace!("wizard <- {:?}", msg);
        match msg {
            Msg::Init => {
                let mut effects: Vec<Effect> = self.begin_reconcile().into_iter().collect();
                effects.push(Effect::CheckHealth);
                effects
            }
            Msg::InputChanged(text) => {
                self.state.input = text;
                Vec::new()
            }
            Msg::Action(action) => match self.handle_action(action) {
                Ok(effects) => effects,
                Err(e) => {
                    log::debug!("{} rejected: {}", action, e);
                    Vec::new()
                }
            },
            Msg::HostBack => self.retreat().into_iter().collect(),
            Msg::UserLoaded { token, result } => {
                self.finish_reconcile(token, result);
                Vec::new()
            }
            Msg::FieldSynced { token, result } => {
                if let Err(e) = self.finish_submit(token, result) {
                    log::warn!("Field sync failed: {}", e);
                }
                Vec::new()
            }
            Msg::HealthChecked(result) => {
                match &result {
                    Ok(health) => log::info!(
                        "Backend health: {} (database: {})",
                        health.status,
                        health.database.as_deref().unwrap_or("unknown")
                    ),
                    Err(e) => log::warn!("Backend health check failed: {}", e),
                }
                self.state.backend_healthy = Some(result.map(|h| h.is_ok()).unwrap_or(false));
                Vec::new()
            }
            Msg::DismissNotice => {
                self.state.notice = None;
                Vec::new()
            }
        }
    }

    /// Dispatch a button action.
    ///
    /// Submit actions read the active input. Validation and busy errors are
    /// also recorded in the state for display.
    pub fn handle_action(&mut self, action: ActionId) -> Result<Vec<Effect>, WizardError> {
        match action {
            ActionId::SubmitName => self.submit_input(Field::Name),
            ActionId::SubmitTown => self.submit_input(Field::Town),
            ActionId::Next => {
                self.advance();
                Ok(Vec::new())
            }
            ActionId::Prev => Ok(self.retreat().into_iter().collect()),
            ActionId::StartLesson => Ok(vec![self.notify(LESSON_NOTICE)]),
            ActionId::Settings => Ok(vec![self.notify(SETTINGS_NOTICE)]),
        }
    }

    /// Move to the next block. No-op on the last block.
    pub fn advance(&mut self) -> bool {
        if self.state.position >= self.course.last_index() {
            return false;
        }
        self.state.position += 1;
        self.enter_block();
        true
    }

    /// Move to the previous block; on the first block ask the host to close
    pub fn retreat(&mut self) -> Option<Effect> {
        if self.state.position == 0 {
            return Some(Effect::Close);
        }
        self.state.position -= 1;
        self.enter_block();
        None
    }

    /// Validate `raw` and mark a submission of `field` as in flight.
    ///
    /// Nothing in the draft changes until [`Wizard::finish_submit`] sees a
    /// successful response for the returned token.
    pub fn begin_submit(&mut self, field: Field, raw: &str) -> Result<SyncRequest, WizardError> {
        if self.state.submission.is_some() {
            return Err(WizardError::Busy);
        }
        if self.current_block().kind.field() != Some(field) {
            return Err(WizardError::WrongStep(field));
        }

        let value = raw.trim();
        if value.chars().count() < MIN_FIELD_LEN {
            let err = ValidationError::too_short(field);
            self.state.field_error = Some(err.message.clone());
            return Err(err.into());
        }

        let Some(telegram_id) = self.state.draft.telegram_id else {
            let err = SyncError::MissingIdentity;
            self.state.field_error = Some(err.user_message().to_string());
            return Err(err.into());
        };

        let token = self.state.issue_token();
        self.state.field_error = None;
        self.state.submission = Some(Submission {
            token,
            field,
            value: value.to_string(),
        });
        log::debug!("Submitting {} {}", field, token);

        Ok(SyncRequest {
            token,
            telegram_id,
            username: self.state.draft.username.clone(),
            field,
            value: value.to_string(),
        })
    }

    /// Apply the backend's answer to a submission.
    ///
    /// Returns `Ok(false)` when `token` is not the in-flight submission (the
    /// user navigated away or it was already answered); the state is untouched.
    pub fn finish_submit(
        &mut self,
        token: RequestToken,
        result: Result<(), SyncError>,
    ) -> Result<bool, WizardError> {
        let submission = match self.state.submission.take() {
            Some(s) if s.token == token => s,
            other => {
                self.state.submission = other;
                log::debug!("Discarding stale response {}", token);
                return Ok(false);
            }
        };

        match result {
            Ok(()) => {
                log::info!("Saved {}", submission.field);
                self.state.draft.set(submission.field, submission.value);
                self.advance();
                Ok(true)
            }
            Err(e) => {
                self.state.field_error = Some(e.user_message().to_string());
                Err(e.into())
            }
        }
    }

    /// Start the once-per-session profile reconciliation
    pub fn begin_reconcile(&mut self) -> Option<Effect> {
        if self.state.reconciliation != Reconciliation::NotStarted {
            return None;
        }
        let Some(telegram_id) = self.state.draft.telegram_id else {
            self.state.reconciliation = Reconciliation::Done;
            return None;
        };
        let token = self.state.issue_token();
        self.state.reconciliation = Reconciliation::Pending(token);
        Some(Effect::EnsureUser {
            token,
            telegram_id,
            username: self.state.draft.username.clone(),
        })
    }

    /// Seed empty draft fields from the stored user record.
    ///
    /// Values equal to the server's defaults are skipped, as are fields the
    /// user has already saved in this session. Returns whether the response
    /// was accepted.
    pub fn finish_reconcile(
        &mut self,
        token: RequestToken,
        result: Result<UpsertUserResponse, SyncError>,
    ) -> bool {
        if self.state.reconciliation != Reconciliation::Pending(token) {
            log::debug!("Ignoring reconciliation response {}", token);
            return false;
        }
        self.state.reconciliation = Reconciliation::Done;

        let user = match result {
            Ok(response) => response.user,
            Err(e) => {
                log::warn!("Could not load user profile: {}", e);
                return true;
            }
        };
        let Some(user) = user else {
            return true;
        };

        for field in [Field::Name, Field::Town] {
            let Some(value) = user.field(field) else {
                continue;
            };
            if value.is_empty()
                || self.server_defaults.is_default(field, value)
                || !self.state.draft.get(field).is_empty()
            {
                continue;
            }
            log::debug!("Restored {} from backend", field);
            self.state.draft.set(field, value.to_string());

            let editing = self.current_block().kind.field() == Some(field);
            if editing && self.state.input.is_empty() && self.state.submission.is_none() {
                self.state.input = value.to_string();
            }
        }
        true
    }

    /// Reset per-block presentation state after the position changed.
    /// Any in-flight submission belongs to the block we left and is dropped.
    fn enter_block(&mut self) {
        if let Some(dropped) = self.state.submission.take() {
            log::debug!("Abandoning submission {}", dropped.token);
        }
        self.state.field_error = None;
        self.state.input = self
            .current_block()
            .kind
            .field()
            .map(|field| self.state.draft.get(field).to_string())
            .unwrap_or_default();
    }

    fn submit_input(&mut self, field: Field) -> Result<Vec<Effect>, WizardError> {
        let raw = self.state.input.clone();
        let request = self.begin_submit(field, &raw)?;
        Ok(vec![Effect::SyncField(request)])
    }

    fn notify(&mut self, text: &str) -> Effect {
        self.state.notice = Some(text.to_string());
        Effect::Notify(text.to_string())
    }
}
