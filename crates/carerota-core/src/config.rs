//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL, the last used email and cache tuning.
//!
//! Configuration is stored at `~/.config/carerota/config.json`. The API URL
//! can be overridden with `CAREROTA_API_URL`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheConfig, DEFAULT_KEEP_UNUSED_FOR_SECS};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "carerota";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

pub const API_URL_ENV: &str = "CAREROTA_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub last_email: Option<String>,
    /// Keep the session in the OS keychain instead of the cache directory.
    pub use_keyring: bool,
    /// Idle window before unused cache entries are evicted; 0 keeps them.
    pub keep_unused_for_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            last_email: None,
            use_keyring: false,
            keep_unused_for_secs: DEFAULT_KEEP_UNUSED_FOR_SECS,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Environment first, then the config file, then the default.
    pub fn api_base_url(&self) -> String {
        Self::resolve_api_url(std::env::var(API_URL_ENV).ok(), self.api_base_url.as_deref())
    }

    fn resolve_api_url(env: Option<String>, configured: Option<&str>) -> String {
        env.filter(|url| !url.trim().is_empty())
            .or_else(|| configured.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            keep_unused_for: (self.keep_unused_for_secs > 0)
                .then(|| Duration::from_secs(self.keep_unused_for_secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().expect("tempdir");
        let config = Config::load_from(&dir.path().join(CONFIG_FILE)).expect("load");
        assert_eq!(config, Config::default());
        assert_eq!(
            config.cache_config().keep_unused_for,
            Some(Duration::from_secs(DEFAULT_KEEP_UNUSED_FOR_SECS))
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            api_base_url: Some("https://rota.example.com/api".to_string()),
            last_email: Some("manager@example.com".to_string()),
            use_keyring: true,
            keep_unused_for_secs: 0,
        };
        config.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded, config);
        assert_eq!(loaded.cache_config().keep_unused_for, None);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"last_email":"a@example.com"}"#).expect("write");

        let config = Config::load_from(&path).expect("load");
        assert_eq!(config.last_email.as_deref(), Some("a@example.com"));
        assert_eq!(config.keep_unused_for_secs, DEFAULT_KEEP_UNUSED_FOR_SECS);
    }

    #[test]
    fn test_api_url_precedence() {
        assert_eq!(Config::resolve_api_url(None, None), DEFAULT_API_URL);
        assert_eq!(
            Config::resolve_api_url(None, Some("https://file.example.com")),
            "https://file.example.com"
        );
        assert_eq!(
            Config::resolve_api_url(
                Some("https://env.example.com".to_string()),
                Some("https://file.example.com")
            ),
            "https://env.example.com"
        );
        assert_eq!(
            Config::resolve_api_url(Some("  ".to_string()), Some("https://file.example.com")),
            "https://file.example.com"
        );
    }
}
