use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default)]
    pub project_limit_policy: ProjectLimitPolicy,

    #[serde(default)]
    pub broker: BrokerConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// How many projects count against a subscription's `project_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectLimitPolicy {
    /// Only projects the user owns.
    #[default]
    Owned,
    /// Owned projects plus projects the user is a member of.
    OwnedAndMember,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Base URL of the RabbitMQ management API.
    #[serde(default = "default_broker_url")]
    pub base_url: String,

    #[serde(default = "default_broker_user")]
    pub user: String,

    #[serde(default = "default_broker_user")]
    pub password: String,

    #[serde(default = "default_vhost")]
    pub vhost: String,

    #[serde(default = "default_exchange")]
    pub exchange: String,

    /// Validate messages but never contact the broker.
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,

    #[serde(default = "default_keywords_per_search")]
    pub keywords_per_search: usize,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newsdesk");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("newsdesk.db").to_string_lossy().to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:8787".to_string()
}

fn default_broker_url() -> String {
    "http://127.0.0.1:15672".to_string()
}

fn default_broker_user() -> String {
    "guest".to_string()
}

fn default_vhost() -> String {
    "/".to_string()
}

fn default_exchange() -> String {
    "amq.default".to_string()
}

fn default_dry_run() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_keywords_per_search() -> usize {
    5
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            base_url: default_broker_url(),
            user: default_broker_user(),
            password: default_broker_user(),
            vhost: default_vhost(),
            exchange: default_exchange(),
            dry_run: default_dry_run(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            keywords_per_search: default_keywords_per_search(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            listen_addr: default_listen_addr(),
            project_limit_policy: ProjectLimitPolicy::default(),
            broker: BrokerConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Config {
    /// Loads the config file (writing defaults on first run), then applies
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("NEWSDESK_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newsdesk")
            .join("config.toml")
    }

    pub fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = var("DATABASE_PATH") {
            self.db_path = path;
        }
        if let Some(addr) = var("LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(url) = var("RABBITMQ_URL") {
            self.broker.base_url = url;
        }
        if let Some(user) = var("RABBITMQ_USER") {
            self.broker.user = user;
        }
        if let Some(password) = var("RABBITMQ_PASSWORD") {
            self.broker.password = password;
        }
        if let Some(skip) = var("SKIP_JOBS") {
            self.broker.dry_run = skip.trim().eq_ignore_ascii_case("true");
        }
    }
}
