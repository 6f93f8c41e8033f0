//! State types for the onboarding wizard

use serde::{Deserialize, Serialize};

/// A user profile field collected by the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Town,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Town => "town",
        }
    }

    /// Inline message shown when the entered value is too short
    pub fn too_short_message(&self) -> &'static str {
        match self {
            Self::Name => "Enter your name (at least 2 characters)",
            Self::Town => "Enter your city (at least 2 characters)",
        }
    }

    /// Hint shown inside an empty input
    pub fn input_hint(&self) -> &'static str {
        match self {
            Self::Name => "Your name...",
            Self::Town => "Your city...",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locally held user profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDraft {
    pub name: String,
    pub town: String,
    pub telegram_id: Option<i64>,
    pub username: Option<String>,
}

impl UserDraft {
    pub fn new(telegram_id: Option<i64>, username: Option<String>) -> Self {
        Self {
            telegram_id,
            username,
            ..Self::default()
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Town => &self.town,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Name => self.name = value,
            Field::Town => self.town = value,
        }
    }
}

/// Identifies one remote call so its response can be matched to the request
/// that is still current
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub u64);

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A field submission waiting for the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub token: RequestToken,
    pub field: Field,
    pub value: String,
}

/// Progress of the once-per-session profile reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reconciliation {
    #[default]
    NotStarted,
    Pending(RequestToken),
    Done,
}

/// Main state of the wizard
#[derive(Debug, Clone, Default)]
pub struct WizardState {
    /// Index of the block being shown
    pub(super) position: usize,

    /// Confirmed profile fields
    pub draft: UserDraft,

    /// Text of the active input; local until submitted
    pub input: String,

    /// Inline error below the input or buttons
    pub field_error: Option<String>,

    /// In-flight field submission; the submit control is disabled while set
    pub submission: Option<Submission>,

    /// Message from a terminal action ("start lesson", "settings")
    pub notice: Option<String>,

    /// Outcome of the last health probe, for the status line
    pub backend_healthy: Option<bool>,

    pub(super) reconciliation: Reconciliation,

    next_token: u64,
}

impl WizardState {
    pub fn new(draft: UserDraft) -> Self {
        Self {
            draft,
            ..Self::default()
        }
    }

    /// Whether a submission is in flight
    pub fn is_submitting(&self) -> bool {
        self.submission.is_some()
    }

    pub(super) fn issue_token(&mut self) -> RequestToken {
        self.next_token += 1;
        RequestToken(self.next_token)
    }
}
