//! Host session: who the wizard runs for and what token it forwards

use thiserror::Error;

use super::init_data::{InitData, InitDataError};
use crate::wizard::UserDraft;

/// Where the session's user id came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    InitData,
    Override,
    /// Synthesized from the clock in debug mode
    Temporary,
    Missing,
}

impl IdentitySource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::InitData => "init data",
            Self::Override => "override",
            Self::Temporary => "temporary (debug)",
            Self::Missing => "missing",
        }
    }
}

/// Explicit identity given on the command line or in the config
#[derive(Debug, Clone, Default)]
pub struct IdentityOverrides {
    pub telegram_id: Option<i64>,
    pub username: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HostSession {
    pub telegram_id: Option<i64>,
    pub username: Option<String>,
    /// Opaque token forwarded in `X-Telegram-Init-Data`; may be empty
    pub init_data: String,
    pub source: IdentitySource,
}

impl HostSession {
    /// Build the session from the raw init data and any overrides.
    ///
    /// Overrides win over the init data. In debug mode a session without any
    /// user id gets a temporary one from the current time in milliseconds.
    pub fn resolve(
        init_data: Option<&str>,
        overrides: &IdentityOverrides,
        debug: bool,
    ) -> Result<Self, InitDataError> {
        let raw = init_data.map(str::trim).unwrap_or_default();
        let user = if raw.is_empty() {
            None
        } else {
            InitData::parse(raw)?.user
        };

        let (mut telegram_id, mut source) = match (&overrides.telegram_id, &user) {
            (Some(id), _) => (Some(*id), IdentitySource::Override),
            (None, Some(user)) => (Some(user.id), IdentitySource::InitData),
            (None, None) => (None, IdentitySource::Missing),
        };

        if telegram_id.is_none() && debug {
            let temporary = chrono::Utc::now().timestamp_millis();
            log::warn!("No Telegram user available, using temporary id {}", temporary);
            telegram_id = Some(temporary);
            source = IdentitySource::Temporary;
        }

        let username = overrides
            .username
            .clone()
            .or_else(|| user.and_then(|u| u.username));

        Ok(Self {
            telegram_id,
            username,
            init_data: raw.to_string(),
            source,
        })
    }

    /// Fresh draft for this session
    pub fn draft(&self) -> UserDraft {
        UserDraft::new(self.telegram_id, self.username.clone())
    }
}

/// The app was opened outside Telegram
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Access restricted: this app can only be used through the Telegram bot ({reason}). Open https://t.me/{bot_username}")]
pub struct AccessDenied {
    pub reason: String,
    pub bot_username: String,
}

impl AccessDenied {
    pub fn bot_link(&self) -> String {
        format!("https://t.me/{}", self.bot_username)
    }
}

/// Gate the wizard on a Telegram-issued session. Debug mode skips the check.
pub fn check_access(session: &HostSession, debug: bool, bot_username: &str) -> Result<(), AccessDenied> {
    if debug {
        log::debug!("Debug mode: Telegram access check skipped");
        return Ok(());
    }

    let reason = if session.init_data.is_empty() {
        "missing Telegram authorization data"
    } else if session.telegram_id.is_none() {
        "no Telegram user in authorization data"
    } else {
        return Ok(());
    };

    Err(AccessDenied {
        reason: reason.to_string(),
        bot_username: bot_username.to_string(),
    })
}
