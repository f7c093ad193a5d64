//! Configuration management for storyreel
//!
//! Settings load from an optional `storyreel.toml` (working directory first,
//! then the platform config directory), with environment variables taking
//! precedence over both.

use crate::error::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Get the global storyreel directory for storing configuration
pub fn get_global_config_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "storyreel", "storyreel")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Base URL of the pipeline backend, including the API prefix
    pub base_url: String,
    /// Per-request timeout enforced by the HTTP client
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollConfig {
    /// Interval between generation status queries
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_ms: 2000 }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Config {
    /// Load configuration, resolving in order: explicit path, then
    /// `./storyreel.toml`, then the platform config dir, then defaults.
    /// Environment variables override whatever was loaded.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_path(explicit)? {
            Some(path) => Self::from_file(&path)?,
            None => Config::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn resolve_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Some(path.to_path_buf()));
        }

        let local = PathBuf::from("storyreel.toml");
        if local.exists() {
            return Ok(Some(local));
        }

        if let Ok(dir) = get_global_config_dir() {
            let global = dir.join("storyreel.toml");
            if global.exists() {
                return Ok(Some(global));
            }
        }

        Ok(None)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("STORYREEL_API_URL") {
            if !url.is_empty() {
                self.api.base_url = url;
            }
        }
        if let Ok(ms) = std::env::var("STORYREEL_POLL_INTERVAL_MS") {
            if let Ok(ms) = ms.parse() {
                self.poll.interval_ms = ms;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8000/api/v1");
        assert_eq!(config.api.timeout_secs, 120);
        assert_eq!(config.poll.interval_ms, 2000);
        assert_eq!(config.poll.interval(), Duration::from_millis(2000));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"https://pipeline.example/api/v1\"\ntimeout_secs = 30"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.api.base_url, "https://pipeline.example/api/v1");
        assert_eq!(config.api.timeout_secs, 30);
        // unspecified section falls back to defaults
        assert_eq!(config.poll.interval_ms, 2000);
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/storyreel.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [[[").unwrap();
        assert!(Config::from_file(file.path()).is_err());
    }
}
