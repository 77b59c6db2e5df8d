use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// Backend origin: the command line (flag or environment) first, then the
    /// config file, then localhost
    pub fn api_url(&self, from_cli: Option<&str>) -> String {
        resolve_api_url(from_cli, self.api_url.as_deref())
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("cognify").join("config.json"))
    }
}

fn resolve_api_url(from_cli: Option<&str>, from_file: Option<&str>) -> String {
    [from_cli, from_file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(DEFAULT_API_URL)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_defaults_to_localhost() {
        assert_eq!(resolve_api_url(None, None), "http://localhost:8000");
    }

    #[test]
    fn test_command_line_beats_config_file() {
        assert_eq!(
            resolve_api_url(Some("http://api:9000"), Some("http://file:1")),
            "http://api:9000"
        );
        assert_eq!(resolve_api_url(None, Some("http://file:1")), "http://file:1");
    }

    #[test]
    fn test_blank_values_are_skipped() {
        assert_eq!(resolve_api_url(Some("  "), Some("")), DEFAULT_API_URL);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_url":"http://study.local","log_level":"debug"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_url(None), "http://study.local");
        assert_eq!(loaded.api_url(Some("http://flag:1")), "http://flag:1");
        assert_eq!(loaded.log_level(), "debug");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.api_url.is_none());
        assert_eq!(loaded.log_level(), "info");
    }
}
