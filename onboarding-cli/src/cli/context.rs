use std::path::PathBuf;

use anyhow::{Context, Result};

use super::GlobalArgs;
use crate::api::BackendClient;
use crate::config::Config;
use crate::telegram::{HostSession, IdentityOverrides};
use crate::wizard::Wizard;

/// Effective configuration for one invocation
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
}

impl AppContext {
    /// Config file, then environment, then command line flags
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let config_path = global.config.clone().unwrap_or_else(Config::path);
        let mut config = Config::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        apply_flags(&mut config, global);

        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn session(&self) -> Result<HostSession> {
        let telegram = &self.config.telegram;
        let overrides = IdentityOverrides {
            telegram_id: telegram.telegram_id,
            username: telegram.username.clone(),
        };
        HostSession::resolve(telegram.init_data.as_deref(), &overrides, self.config.debug)
            .context("Invalid Telegram init data")
    }

    pub fn backend(&self, session: &HostSession) -> Result<BackendClient> {
        BackendClient::new(&self.config.api, session.init_data.clone())
    }

    pub fn wizard(&self, session: &HostSession) -> Result<Wizard> {
        Ok(Wizard::new(
            self.config.course()?,
            session.draft(),
            self.config.server_defaults.clone(),
        ))
    }
}

pub fn apply_flags(config: &mut Config, global: &GlobalArgs) {
    if let Some(url) = &global.api_url {
        config.api.base_url = url.clone();
    }
    if global.debug {
        config.debug = true;
    }
    if let Some(init_data) = &global.init_data {
        config.telegram.init_data = Some(init_data.clone());
    }
    if let Some(id) = global.telegram_id {
        config.telegram.telegram_id = Some(id);
    }
    if let Some(username) = &global.username {
        config.telegram.username = Some(username.trim_start_matches('@').to_string());
    }
    if let Some(course) = &global.course {
        config.course_path = Some(course.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::session::IdentitySource;

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        config.telegram.telegram_id = Some(1);

        let global = GlobalArgs {
            api_url: Some("http://localhost:8000/api/v1".into()),
            telegram_id: Some(2),
            username: Some("@alex".into()),
            ..GlobalArgs::default()
        };
        apply_flags(&mut config, &global);

        assert_eq!(config.api.base_url, "http://localhost:8000/api/v1");
        assert_eq!(config.telegram.telegram_id, Some(2));
        assert_eq!(config.telegram.username.as_deref(), Some("alex"));
        assert!(!config.debug);
    }

    #[test]
    fn test_debug_flag_only_enables() {
        let mut config = Config {
            debug: true,
            ..Config::default()
        };
        apply_flags(&mut config, &GlobalArgs::default());
        assert!(config.debug);
    }

    #[test]
    fn test_session_and_wizard_from_config() {
        let mut config = Config::default();
        config.telegram.telegram_id = Some(9);
        let context = AppContext {
            config,
            config_path: PathBuf::from("config.toml"),
        };

        let session = context.session().unwrap();
        assert_eq!(session.source, IdentitySource::Override);

        let wizard = context.wizard(&session).unwrap();
        assert_eq!(wizard.position(), 0);
        assert_eq!(wizard.draft().telegram_id, Some(9));
    }
}
