use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub sync: SyncConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    pub request_timeout_seconds: u64,
    pub concurrency_limit: usize,
    pub refresh_interval_minutes: u64,
    pub progress_interval_millis: u64,
    pub max_redirects: usize,
    pub user_agent: String,
    /// Replaces the built-in curated list when set.
    pub curated_feeds: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 10,
            concurrency_limit: 30,
            refresh_interval_minutes: 30,
            progress_interval_millis: 1000,
            max_redirects: 5,
            user_agent: concat!("feedsync/", env!("CARGO_PKG_VERSION")).to_owned(),
            curated_feeds: None,
        }
    }
}

impl SyncConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes.max(1) * 60)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_millis.max(50))
    }

    /// Never zero, otherwise a batch could not make progress.
    pub fn concurrency(&self) -> usize {
        self.concurrency_limit.max(1)
    }
}

impl AppConfig {
    /// `~/.config/feedsync` on Linux.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("feedsync"))
    }

    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Loads the default config file, falling back to defaults on any error.
    pub fn load() -> Self {
        match Self::config_file_path().and_then(|path| Self::load_from_file(&path)) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "could not load configuration, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to_file(&Self::config_file_path()?)
    }

    /// Directory holding the JSON store files.
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::config_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "sync": { "concurrencyLimit": 8 } }"#).unwrap();
        assert_eq!(config.sync.concurrency_limit, 8);
        assert_eq!(config.sync.request_timeout_seconds, 10);
        assert_eq!(config.sync.progress_interval(), Duration::from_secs(1));
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn zero_limit_is_clamped() {
        let config = SyncConfig {
            concurrency_limit: 0,
            ..SyncConfig::default()
        };
        assert_eq!(config.concurrency(), 1);
    }
}
