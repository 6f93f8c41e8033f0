//! Messages into the wizard core and effects out of it

use super::content::ActionId;
use super::state::{Field, RequestToken};
use crate::api::{HealthStatus, SyncError, UpsertUserResponse};

/// Everything that can happen to the wizard
#[derive(Debug, Clone)]
pub enum Msg {
    /// Session started: reconcile the profile and probe the backend
    Init,
    /// Text of the active input changed
    InputChanged(String),
    /// A block button was activated
    Action(ActionId),
    /// Host back button: previous block, or close on the first one
    HostBack,
    /// Reconciliation upsert finished
    UserLoaded {
        token: RequestToken,
        result: Result<UpsertUserResponse, SyncError>,
    },
    /// Field submission finished
    FieldSynced {
        token: RequestToken,
        result: Result<(), SyncError>,
    },
    /// Health probe finished
    HealthChecked(Result<HealthStatus, SyncError>),
    /// Close the notice popup
    DismissNotice,
}

/// A validated field value on its way to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub token: RequestToken,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub field: Field,
    pub value: String,
}

/// Side effects requested by the core, performed by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Upsert the user once and report back with `Msg::UserLoaded`
    EnsureUser {
        token: RequestToken,
        telegram_id: i64,
        username: Option<String>,
    },
    /// Upsert the user, then patch one field; report with `Msg::FieldSynced`
    SyncField(SyncRequest),
    /// Probe the backend; report with `Msg::HealthChecked`
    CheckHealth,
    /// Show a message from a terminal action
    Notify(String),
    /// Ask the host to close the app
    Close,
}
