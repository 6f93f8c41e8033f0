//! Async owning handle around the wizard core
//!
//! [`WizardController`] executes the effects [`Wizard`] asks for against a
//! [`UserBackend`] and feeds the results back in. It is what the headless
//! `apply` command drives; the TUI performs the same effects through
//! [`perform`] on spawned tasks instead.

use super::content::{ActionId, Block};
use super::error::WizardError;
use super::machine::Wizard;
use super::msg::{Effect, Msg, SyncRequest};
use super::state::{Field, UserDraft};
use crate::api::{CreateUserRequest, SyncError, UserBackend, UserPatch};

/// Run one I/O effect and return the message reporting its outcome.
/// Boundary effects (`Notify`, `Close`) are not I/O and yield `None`.
pub async fn perform<B>(backend: &B, effect: Effect) -> Option<Msg>
where
    B: UserBackend + ?Sized,
{
    match effect {
        Effect::EnsureUser {
            token,
            telegram_id,
            username,
        } => {
            let result = backend
                .upsert_user(&CreateUserRequest {
                    telegram_id,
                    username,
                })
                .await;
            Some(Msg::UserLoaded { token, result })
        }
        Effect::SyncField(request) => {
            let result = sync_field(backend, &request).await;
            Some(Msg::FieldSynced {
                token: request.token,
                result,
            })
        }
        Effect::CheckHealth => Some(Msg::HealthChecked(backend.health().await)),
        Effect::Notify(_) | Effect::Close => None,
    }
}

/// Make sure the user record exists, then patch the single field
pub async fn sync_field<B>(backend: &B, request: &SyncRequest) -> Result<(), SyncError>
where
    B: UserBackend + ?Sized,
{
    backend
        .upsert_user(&CreateUserRequest {
            telegram_id: request.telegram_id,
            username: request.username.clone(),
        })
        .await?;

    backend
        .patch_user(
            request.telegram_id,
            &UserPatch::single(request.field, request.value.clone()),
        )
        .await
}

pub struct WizardController<B> {
    wizard: Wizard,
    backend: B,
}

impl<B: UserBackend> WizardController<B> {
    pub fn new(wizard: Wizard, backend: B) -> Self {
        Self { wizard, backend }
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn current_block(&self) -> &Block {
        self.wizard.current_block()
    }

    pub fn position(&self) -> usize {
        self.wizard.position()
    }

    pub fn draft(&self) -> &UserDraft {
        self.wizard.draft()
    }

    /// Reconcile the profile with the backend and probe its health.
    /// Returns any boundary effects produced along the way.
    pub async fn initialize(&mut self) -> Vec<Effect> {
        self.dispatch(Msg::Init).await
    }

    /// Validate, persist and, on success, store `raw` and advance
    pub async fn submit_field(&mut self, field: Field, raw: &str) -> Result<(), WizardError> {
        self.wizard.update(Msg::InputChanged(raw.to_string()));
        let request = self.wizard.begin_submit(field, raw)?;
        let result = sync_field(&self.backend, &request).await;
        self.wizard.finish_submit(request.token, result)?;
        Ok(())
    }

    /// Dispatch a button action. Submit actions use the current input text.
    pub async fn handle_action(&mut self, action: ActionId) -> Result<Vec<Effect>, WizardError> {
        if let Some(field) = action.submitted_field() {
            let raw = self.wizard.state().input.clone();
            self.submit_field(field, &raw).await?;
            return Ok(Vec::new());
        }
        self.wizard.handle_action(action)
    }

    /// Feed `msg` to the core and run the resulting I/O to completion
    pub async fn dispatch(&mut self, msg: Msg) -> Vec<Effect> {
        let mut boundary = Vec::new();
        let mut pending = self.wizard.update(msg);

        while !pending.is_empty() {
            let mut next = Vec::new();
            for effect in pending {
                match effect {
                    Effect::Notify(_) | Effect::Close => boundary.push(effect),
                    io => {
                        if let Some(reply) = perform(&self.backend, io).await {
                            next.extend(self.wizard.update(reply));
                        }
                    }
                }
            }
            pending = next;
        }

        boundary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::RemoteUser;
    use crate::api::{HealthStatus, UpsertUserResponse};
    use crate::wizard::content::{BlockKind, Button, Course};
    use crate::wizard::machine::ServerDefaults;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory backend recording every call
    #[derive(Default)]
    struct FakeBackend {
        stored: Mutex<RemoteUser>,
        fail_upsert: bool,
        patch_status: Option<u16>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn with_user(name: &str, town: &str) -> Self {
            Self {
                stored: Mutex::new(RemoteUser {
                    name: Some(name.to_string()),
                    town: Some(town.to_string()),
                    ..RemoteUser::default()
                }),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UserBackend for FakeBackend {
        async fn upsert_user(
            &self,
            request: &CreateUserRequest,
        ) -> Result<UpsertUserResponse, SyncError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("upsert {}", request.telegram_id));
            if self.fail_upsert {
                return Err(SyncError::Unreachable("connection refused".into()));
            }
            Ok(UpsertUserResponse {
                success: true,
                message: None,
                user: Some(self.stored.lock().unwrap().clone()),
                created: false,
            })
        }

        async fn patch_user(&self, telegram_id: i64, patch: &UserPatch) -> Result<(), SyncError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("patch {}", telegram_id));
            if let Some(status) = self.patch_status {
                return Err(SyncError::from_status(status, ""));
            }
            let mut stored = self.stored.lock().unwrap();
            if let Some(name) = &patch.name {
                stored.name = Some(name.clone());
            }
            if let Some(town) = &patch.town {
                stored.town = Some(town.clone());
            }
            Ok(())
        }

        async fn health(&self) -> Result<HealthStatus, SyncError> {
            Ok(HealthStatus {
                status: "OK".into(),
                database: Some("connected".into()),
                timestamp: None,
                debug: None,
            })
        }
    }

    fn course() -> Course {
        let block = |kind, action| Block {
            title: "t".into(),
            text: "x".into(),
            image: None,
            placeholder: None,
            kind,
            buttons: vec![Button {
                text: "go".into(),
                action,
            }],
        };
        Course::new(vec![
            block(BlockKind::NameInput, ActionId::SubmitName),
            block(BlockKind::TownInput, ActionId::SubmitTown),
            block(BlockKind::Plain, ActionId::StartLesson),
        ])
        .unwrap()
    }

    fn controller(backend: FakeBackend) -> WizardController<FakeBackend> {
        let wizard = Wizard::new(
            course(),
            UserDraft::new(Some(7), None),
            ServerDefaults::default(),
        );
        WizardController::new(wizard, backend)
    }

    #[tokio::test]
    async fn test_submit_flow_end_to_end() {
        let mut c = controller(FakeBackend::default());

        c.submit_field(Field::Name, "Al").await.unwrap();
        assert_eq!(c.position(), 1);
        assert_eq!(c.draft().name, "Al");

        c.submit_field(Field::Town, " NY ").await.unwrap();
        assert_eq!(c.position(), 2);
        assert_eq!(c.draft().town, "NY");

        assert!(c.handle_action(ActionId::Next).await.unwrap().is_empty());
        assert_eq!(c.position(), 2);

        assert_eq!(
            c.backend.calls(),
            vec!["upsert 7", "patch 7", "upsert 7", "patch 7"]
        );
    }

    #[tokio::test]
    async fn test_validation_error_makes_no_calls() {
        let mut c = controller(FakeBackend::default());
        let err = c.submit_field(Field::Name, "A").await.unwrap_err();
        assert!(matches!(err, WizardError::Validation(_)));
        assert_eq!(c.position(), 0);
        assert!(c.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_failure_stops_before_patch() {
        let mut c = controller(FakeBackend {
            fail_upsert: true,
            ..FakeBackend::default()
        });
        let before = c.draft().clone();

        let err = c.submit_field(Field::Name, "Alex").await.unwrap_err();
        assert!(matches!(err, WizardError::Sync(SyncError::Unreachable(_))));
        assert_eq!(c.position(), 0);
        assert_eq!(c.draft(), &before);
        assert_eq!(c.backend.calls(), vec!["upsert 7"]);
    }

    #[tokio::test]
    async fn test_patch_failure_keeps_state() {
        let mut c = controller(FakeBackend {
            patch_status: Some(403),
            ..FakeBackend::default()
        });
        let before = c.draft().clone();

        let err = c.submit_field(Field::Name, "Alex").await.unwrap_err();
        assert_eq!(
            err.user_message(),
            "Access denied. Open the app through the Telegram bot."
        );
        assert_eq!(c.position(), 0);
        assert_eq!(c.draft(), &before);
        assert!(!c.wizard().state().is_submitting());
    }

    #[tokio::test]
    async fn test_initialize_seeds_known_fields() {
        let defaults = ServerDefaults::default();
        let mut c = controller(FakeBackend::with_user("Alex", &defaults.town));

        let boundary = c.initialize().await;
        assert!(boundary.is_empty());
        assert_eq!(c.draft().name, "Alex");
        assert_eq!(c.draft().town, "");
        assert_eq!(c.wizard().state().backend_healthy, Some(true));
    }

    #[tokio::test]
    async fn test_handle_action_uses_input_and_returns_boundary_effects() {
        let mut c = controller(FakeBackend::with_user("Alex", "Oslo"));
        c.initialize().await;

        // Restored values are prefilled, so submitting straight away works
        c.handle_action(ActionId::SubmitName).await.unwrap();
        c.handle_action(ActionId::SubmitTown).await.unwrap();
        assert_eq!(c.position(), 2);

        let effects = c.handle_action(ActionId::StartLesson).await.unwrap();
        assert!(matches!(effects.as_slice(), [Effect::Notify(_)]));

        c.wizard.update(Msg::DismissNotice);
        assert!(c.handle_action(ActionId::Prev).await.unwrap().is_empty());
        assert_eq!(c.position(), 1);
        c.handle_action(ActionId::Next).await.unwrap();
        assert_eq!(c.position(), 2);
    }

    #[tokio::test]
    async fn test_submit_for_another_step_makes_no_calls() {
        let mut c = controller(FakeBackend::default());
        let err = c.submit_field(Field::Town, "Oslo").await.unwrap_err();
        assert_eq!(err, WizardError::WrongStep(Field::Town));
        assert_eq!(c.position(), 0);
        assert_eq!(c.draft().town, "");
        assert!(c.backend.calls().is_empty());
    }
}
