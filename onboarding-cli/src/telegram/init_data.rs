//! Telegram Mini App init data
//!
//! The host passes the app a query string such as
//! `query_id=...&user=%7B...%7D&auth_date=...&hash=...`. The wizard only
//! forwards it to the backend, but the user id and username it carries are
//! needed to key the user record, and it can be verified locally against the
//! bot token for diagnostics.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Key used to derive the secret from the bot token
const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";

#[derive(Debug, Error)]
pub enum InitDataError {
    #[error("init data is empty")]
    Empty,
    #[error("init data is not valid percent-encoding: {0}")]
    Encoding(String),
    #[error("user field is not valid JSON: {0}")]
    User(#[from] serde_json::Error),
    #[error("init data has no hash")]
    MissingHash,
    #[error("init data hash is not hex")]
    MalformedHash,
    #[error("init data signature does not match the bot token")]
    BadSignature,
}

/// The `user` object of the init data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
}

#[derive(Debug, Clone)]
pub struct InitData {
    fields: BTreeMap<String, String>,
    pub user: Option<TelegramUser>,
}

impl InitData {
    pub fn parse(raw: &str) -> Result<Self, InitDataError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(InitDataError::Empty);
        }

        let mut fields = BTreeMap::new();
        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            fields.insert(decode(key)?, decode(value)?);
        }

        let user = match fields.get("user") {
            Some(json) => Some(serde_json::from_str::<TelegramUser>(json)?),
            None => None,
        };

        Ok(Self { fields, user })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn auth_date(&self) -> Option<i64> {
        self.get("auth_date").and_then(|v| v.parse().ok())
    }

    pub fn query_id(&self) -> Option<&str> {
        self.get("query_id")
    }

    /// Sorted `key=value` lines of every field but `hash`
    pub fn data_check_string(&self) -> String {
        self.fields
            .iter()
            .filter(|(key, _)| key.as_str() != "hash")
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Check the `hash` field against `bot_token`.
    ///
    /// secret = HMAC-SHA256(key = "WebAppData", bot_token);
    /// hash = hex(HMAC-SHA256(key = secret, data_check_string)).
    pub fn verify(&self, bot_token: &str) -> Result<(), InitDataError> {
        let hash = self.get("hash").ok_or(InitDataError::MissingHash)?;
        let expected = hex::decode(hash).map_err(|_| InitDataError::MalformedHash)?;

        let mut mac = HmacSha256::new_from_slice(WEB_APP_DATA_KEY)
            .map_err(|_| InitDataError::BadSignature)?;
        mac.update(bot_token.as_bytes());
        let secret = mac.finalize().into_bytes();

        let mut mac =
            HmacSha256::new_from_slice(&secret).map_err(|_| InitDataError::BadSignature)?;
        mac.update(self.data_check_string().as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| InitDataError::BadSignature)
    }
}

fn decode(part: &str) -> Result<String, InitDataError> {
    let spaced = part.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .map_err(|e| InitDataError::Encoding(e.to_string()))
}
