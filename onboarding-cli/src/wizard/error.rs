use thiserror::Error;

use super::state::Field;
use crate::api::SyncError;

/// Entered value rejected before any network call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: Field,
    pub message: String,
}

impl ValidationError {
    pub fn too_short(field: Field) -> Self {
        Self {
            field,
            message: field.too_short_message().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    /// A submission for this wizard is already waiting for the backend
    #[error("a submission is already in progress")]
    Busy,

    /// The current block does not collect this field
    #[error("{0} is not entered on this step")]
    WrongStep(Field),
}

impl WizardError {
    /// Text shown inline to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.message.clone(),
            Self::Sync(e) => e.user_message().to_string(),
            Self::Busy => "Saving...".to_string(),
            Self::WrongStep(_) => "Nothing to save on this step.".to_string(),
        }
    }
}
