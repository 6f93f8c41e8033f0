//! Application configuration
//!
//! Stored as TOML at `~/.config/onboarding/config.toml`. Values resolve in
//! this order, later wins: built-in defaults, the config file, environment
//! variables (a `.env` file is loaded first), command line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::Endpoints;
use crate::wizard::{Course, ServerDefaults};

pub const APP_DIR: &str = "onboarding";
pub const DEFAULT_BASE_URL: &str = "https://webapp.smokybot.com/api/v1";
pub const DEFAULT_BOT_USERNAME: &str = "smokyaibot";

pub const ENV_BASE_URL: &str = "ONBOARDING_API_BASE_URL";
pub const ENV_DEBUG: &str = "ONBOARDING_DEBUG";
pub const ENV_BOT_USERNAME: &str = "ONBOARDING_BOT_USERNAME";
pub const ENV_INIT_DATA: &str = "TELEGRAM_INIT_DATA";
pub const ENV_TIMEOUT: &str = "ONBOARDING_TIMEOUT_SECS";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Skips the Telegram access gate and allows a temporary user id
    pub debug: bool,
    /// Course file to use instead of the built-in one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_path: Option<PathBuf>,
    pub api: ApiConfig,
    pub telegram: TelegramConfig,
    pub server_defaults: ServerDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub endpoints: Endpoints,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 15,
            endpoints: Endpoints::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot the access gate points users to
    pub bot_username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_username: DEFAULT_BOT_USERNAME.to_string(),
            init_data: None,
            telegram_id: None,
            username: None,
        }
    }
}

impl Config {
    /// `~/.config/onboarding/config.toml`
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Log file used while the TUI owns the terminal
    pub fn log_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("onboarding.log")
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        log::info!("Wrote config to {}", path.display());
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Apply environment overrides. `lookup` is normally `std::env::var(..).ok()`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_BASE_URL) {
            self.api.base_url = url.trim().to_string();
        }
        if let Some(flag) = get(ENV_DEBUG) {
            self.debug = parse_flag(&flag)
                .with_context(|| format!("{} must be a boolean, got '{}'", ENV_DEBUG, flag))?;
        }
        if let Some(bot) = get(ENV_BOT_USERNAME) {
            self.telegram.bot_username = bot.trim().trim_start_matches('@').to_string();
        }
        if let Some(init_data) = get(ENV_INIT_DATA) {
            self.telegram.init_data = Some(init_data);
        }
        if let Some(timeout) = get(ENV_TIMEOUT) {
            self.api.timeout_secs = timeout.trim().parse().with_context(|| {
                format!("{} must be a number of seconds, got '{}'", ENV_TIMEOUT, timeout)
            })?;
        }
        Ok(())
    }

    /// The configured course, or the built-in one
    pub fn course(&self) -> Result<Course> {
        match &self.course_path {
            Some(path) => Course::load(path)
                .with_context(|| format!("Failed to load course {}", path.display())),
            None => Course::builtin().context("Built-in course is invalid"),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
