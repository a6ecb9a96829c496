use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

/// Backend address used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variable overriding the backend address
pub const API_URL_ENV: &str = "TES_API_URL";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub api_url: Option<String>,
    pub user_id: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the config file from the user's config directory.
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Like [`Config::load`], but an unreadable or invalid file is logged
    /// and replaced by the defaults.
    pub fn load_or_default() -> Self {
        Self::or_default(Self::load())
    }

    pub fn load_from_or_default(path: &Path) -> Self {
        Self::or_default(Self::load_from(path))
    }

    fn or_default(loaded: Result<Self>) -> Self {
        loaded.unwrap_or_else(|e| {
            tracing::warn!(error = %format!("{e:#}"), "ignoring config file");
            Self::new()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the backend base URL.
    ///
    /// Order: explicit override (CLI flag), `TES_API_URL`, the config file,
    /// then [`DEFAULT_API_URL`].
    pub fn resolve_api_url(&self, cli_override: Option<&str>) -> String {
        let env_value = std::env::var(API_URL_ENV).ok();
        self.resolve_api_url_with(cli_override, env_value.as_deref())
    }

    fn resolve_api_url_with(&self, cli_override: Option<&str>, env_value: Option<&str>) -> String {
        let chosen = [cli_override, env_value, self.api_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL);

        chosen.trim_end_matches('/').to_string()
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("tes").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url_when_nothing_configured() {
        let config = Config::new();
        assert_eq!(config.resolve_api_url_with(None, None), DEFAULT_API_URL);
    }

    #[test]
    fn test_env_overrides_config_file() {
        let config = Config {
            api_url: Some("http://file:1".to_string()),
            user_id: None,
        };
        assert_eq!(
            config.resolve_api_url_with(None, Some("http://env:2")),
            "http://env:2"
        );
        assert_eq!(config.resolve_api_url_with(None, None), "http://file:1");
    }

    #[test]
    fn test_cli_overrides_env() {
        let config = Config::new();
        assert_eq!(
            config.resolve_api_url_with(Some("http://cli:3"), Some("http://env:2")),
            "http://cli:3"
        );
    }

    #[test]
    fn test_empty_env_is_ignored() {
        let config = Config::new();
        assert_eq!(config.resolve_api_url_with(None, Some("  ")), DEFAULT_API_URL);
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let config = Config::new();
        assert_eq!(
            config.resolve_api_url_with(Some("http://host:8000/"), None),
            "http://host:8000"
        );
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_url": "http://backend:9000", "user_id": "td-42"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_url.as_deref(), Some("http://backend:9000"));
        assert_eq!(config.user_id.as_deref(), Some("td-42"));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert_eq!(Config::load_from_or_default(&path), Config::new());

        fs::write(&path, r#"{"user_id": "td-7"}"#).unwrap();
        assert_eq!(Config::load_from_or_default(&path).user_id.as_deref(), Some("td-7"));
    }
}
