//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL, the token storage backend, and the last
//! email used to log in.
//!
//! Configuration is stored at `~/.config/pathseeker/config.json`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{FileTokenStore, KeyringTokenStore, TokenStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "pathseeker";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides the configured API base URL
pub const API_BASE_ENV: &str = "PATHSEEKER_API_BASE";

/// Local development backend used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/";

/// Where the access/refresh token pair is persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    /// JSON file in the data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
}

impl TokenBackend {
    pub fn display_name(&self) -> &'static str {
        match self {
            TokenBackend::File => "file",
            TokenBackend::Keyring => "keyring",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub token_backend: TokenBackend,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Ok(serde_json::from_str(&contents).context("Failed to parse config file")?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
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

    /// Directory holding persisted session state (tokens)
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Open the token store selected by `token_backend`
    pub fn token_store(&self) -> Result<Arc<dyn TokenStore>> {
        let store: Arc<dyn TokenStore> = match self.token_backend {
            TokenBackend::File => Arc::new(FileTokenStore::new(self.data_dir()?)),
            TokenBackend::Keyring => Arc::new(KeyringTokenStore::new()),
        };
        Ok(store)
    }

    /// Effective API base URL: environment, then config file, then default
    pub fn effective_api_base(&self) -> String {
        resolve_api_base(std::env::var(API_BASE_ENV).ok(), self.api_base_url.as_deref())
    }
}

/// Pick the API base URL from the available sources and normalize it.
pub fn resolve_api_base(env_value: Option<String>, configured: Option<&str>) -> String {
    let chosen = env_value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| configured.map(str::trim).filter(|v| !v.is_empty()))
        .unwrap_or(DEFAULT_API_BASE_URL);
    normalize_base_url(chosen)
}

/// Relative endpoint paths are appended to the base, so it must end with `/`.
pub fn normalize_base_url(base: &str) -> String {
    let trimmed = base.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_api_base_default() {
        assert_eq!(resolve_api_base(None, None), DEFAULT_API_BASE_URL);
        assert_eq!(
            resolve_api_base(Some("  ".to_string()), Some("")),
            DEFAULT_API_BASE_URL
        );
    }

    #[test]
    fn test_resolve_api_base_precedence() {
        assert_eq!(
            resolve_api_base(None, Some("https://cfg.example.com/api/")),
            "https://cfg.example.com/api/"
        );
        assert_eq!(
            resolve_api_base(
                Some("https://env.example.com/api".to_string()),
                Some("https://cfg.example.com/api/")
            ),
            "https://env.example.com/api/"
        );
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: Config = serde_json::from_str("{}").expect("empty config parses");
        assert_eq!(config.token_backend, TokenBackend::File);
        assert!(config.api_base_url.is_none());

        let config: Config = serde_json::from_str(r#"{"token_backend":"keyring","last_email":"a@b.c"}"#)
            .expect("config parses");
        assert_eq!(config.token_backend, TokenBackend::Keyring);
        assert_eq!(config.last_email.as_deref(), Some("a@b.c"));
    }
}
