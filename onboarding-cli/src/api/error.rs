//! Errors raised while talking to the backend

use thiserror::Error;

use super::models::ErrorBody;

/// Failure of a remote call. Connection problems and non-2xx responses are
/// the same kind of failure for the wizard, only the display text differs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("backend returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("no Telegram user id available")]
    MissingIdentity,
}

impl SyncError {
    /// Build the error for a non-2xx response from its raw body.
    ///
    /// The detail is taken from a JSON `detail` field, then `message`, then the
    /// raw body, then the bare status.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(ErrorBody::into_detail)
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| format!("HTTP {}", status));

        Self::Status { status, detail }
    }

    /// Text shown inline next to the failed control
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Status { status: 404, .. } => "User not found. Restart the app.",
            Self::Status { status: 403, .. } => {
                "Access denied. Open the app through the Telegram bot."
            }
            Self::Unreachable(_) => "Server unreachable. Check your connection.",
            _ => "Save failed. Please try again.",
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
                detail: err.to_string(),
            }
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}
