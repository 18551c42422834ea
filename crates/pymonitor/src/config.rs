// PyMonitor - Python Execution Recording Navigator
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Configuration system for the PyMonitor CLI
//!
//! User preferences live in `~/.pymonitor.toml`. Every section has defaults, so a
//! partial file is fine.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where recordings come from
    pub source: SourceConfig,
    /// Live update polling
    pub follow: FollowConfig,
    /// Text rendering
    pub display: DisplayConfig,
}

/// Recording source settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the monitoring API; source arguments that are not files are
    /// resolved against it
    pub api_url: Option<String>,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Live update settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowConfig {
    /// How often a followed source is polled, in milliseconds
    pub poll_interval_ms: u64,
}

/// Rendering settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Show variable types next to values
    pub show_types: bool,
    /// Values longer than this are truncated (0 disables truncation)
    pub max_value_width: usize,
    /// Change table marker for unchanged values
    pub unchanged_marker: String,
    /// Change table marker for variables the snapshot does not have
    pub absent_marker: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { api_url: None, request_timeout_secs: 10 }
    }
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self { poll_interval_ms: 500 }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_types: true,
            max_value_width: 40,
            unchanged_marker: "·".to_string(),
            absent_marker: "-".to_string(),
        }
    }
}

impl SourceConfig {
    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl FollowConfig {
    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(50))
    }
}

impl Config {
    /// Get the config file path (~/.pymonitor.toml)
    pub fn config_path() -> Result<PathBuf> {
        let home =
            dirs::home_dir().ok_or_else(|| eyre::eyre!("Unable to determine home directory"))?;
        Ok(home.join(".pymonitor.toml"))
    }

    /// Load configuration from the default path, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("Config file not found, creating default at {:?}", config_path);
            let default_config = Self::default();
            default_config.save_to_path(&config_path)?;
            return Ok(default_config);
        }

        Self::load_from_path(config_path)
    }

    /// Load configuration from a specific file; a missing file yields the defaults
    pub fn load_from_path(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            debug!("Config file {:?} not found, using defaults", config_path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {config_path:?}"))?;

        let config: Self =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        debug!("Loaded configuration from {:?}", config_path);
        Ok(config)
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: impl AsRef<Path>) -> Result<()> {
        let config_path = config_path.as_ref();
        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config to TOML")?;

        fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {config_path:?}"))?;

        debug!("Saved configuration to {:?}", config_path);
        Ok(())
    }

    /// Override the API base URL (command line or environment)
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if let Some(api_url) = api_url {
            self.source.api_url = Some(api_url);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [display]
            show_types = false
            "#,
        )
        .unwrap();

        assert!(!config.display.show_types);
        assert_eq!(config.display.max_value_width, 40);
        assert_eq!(config.follow, FollowConfig::default());
        assert_eq!(config.source.api_url, None);
    }

    #[test]
    fn test_save_and_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pymonitor.toml");

        let mut config = Config::default();
        config.source.api_url = Some("http://localhost:8000/api".to_string());
        config.follow.poll_interval_ms = 250;
        config.save_to_path(&path).unwrap();

        assert_eq!(Config::load_from_path(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_path(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[display\nshow_types = ").unwrap();
        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    fn test_api_url_override_and_durations() {
        let config = Config::default().with_api_url(Some("http://api".to_string()));
        assert_eq!(config.source.api_url.as_deref(), Some("http://api"));

        let config = config.with_api_url(None);
        assert_eq!(config.source.api_url.as_deref(), Some("http://api"));

        assert_eq!(FollowConfig { poll_interval_ms: 1 }.poll_interval(), Duration::from_millis(50));
        assert_eq!(SourceConfig::default().request_timeout(), Duration::from_secs(10));
    }
}
