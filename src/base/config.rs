//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use super::types::Res;

/// Default free-text query used when a provider is invoked without one.
fn default_query() -> String {
    "tech".to_string()
}

/// Default number of events per page.
fn default_per_page() -> u32 {
    4
}

/// Default delay, in seconds, before the navigation controls are disabled.
fn default_controls_expiry_secs() -> u64 {
    300
}

/// Default request timeout, in seconds, for provider backends.
fn default_search_timeout_secs() -> u64 {
    30
}

/// Configuration for the event-scout application.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Slack app token (`SLACK_APP_TOKEN`).
    pub slack_app_token: String,
    /// Slack bot token (`SLACK_BOT_TOKEN`).
    pub slack_bot_token: String,
    /// Base URL of the event-search backend (`API_URL`).
    pub api_url: String,
    /// Query used when the command is invoked without one (`DEFAULT_QUERY`).
    #[serde(default = "default_query")]
    pub default_query: String,
    /// Events per page (`PER_PAGE`).
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Seconds before the navigation buttons on a sent listing are disabled
    /// (`CONTROLS_EXPIRY_SECS`).
    #[serde(default = "default_controls_expiry_secs")]
    pub controls_expiry_secs: u64,
    /// Request timeout for provider backends, in seconds (`SEARCH_TIMEOUT_SECS`).
    #[serde(default = "default_search_timeout_secs")]
    pub search_timeout_secs: u64,
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("EVENT_SCOUT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        if result.per_page < 1 || result.per_page > 25 {
            return Err(anyhow::anyhow!("Per-page must be between 1 and 25."));
        }

        if result.controls_expiry_secs < 10 {
            return Err(anyhow::anyhow!("Controls expiry must be at least 10 seconds."));
        }

        if result.search_timeout_secs < 1 {
            return Err(anyhow::anyhow!("Search timeout must be at least 1 second."));
        }

        Ok(result)
    }
}
