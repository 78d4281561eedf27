//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\feedback-fm\config.toml
//! - macOS: ~/Library/Application Support/feedback-fm/config.toml
//! - Linux: ~/.config/feedback-fm/config.toml
//!
//! The config file is human-readable and editable. Settings are loaded at
//! startup; command-line flags override individual values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::poll::StaleDataPolicy;
use crate::views::TimeRange;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend connection settings
    pub api: ApiConfig,

    /// Refresh intervals per view
    pub polling: PollingConfig,

    /// View defaults
    pub views: ViewsConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the feedback.fm REST API
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_secs: 15,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Refresh intervals in seconds. Zero is rejected when a view starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub dashboard_secs: u64,
    pub currently_playing_secs: u64,
    /// Now-playing card embedded in the dashboard
    pub now_playing_widget_secs: u64,
    pub top_lists_secs: u64,
    pub history_secs: u64,
    pub playlists_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            dashboard_secs: 60,
            currently_playing_secs: 5,
            now_playing_widget_secs: 10,
            top_lists_secs: 300,
            history_secs: 60,
            playlists_secs: 300,
        }
    }
}

/// View defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewsConfig {
    /// Time range used when none is given on the command line
    pub default_time_range: TimeRange,

    /// Number of history entries requested (1-100)
    pub history_limit: u32,

    /// Whether an error keeps the last good data visible
    pub stale_data: StaleDataPolicy,

    /// Optional file with one now-playing quip per line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quips_path: Option<PathBuf>,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            default_time_range: TimeRange::MediumTerm,
            history_limit: 50,
            stale_data: StaleDataPolicy::Retain,
            quips_path: None,
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("feedback-fm"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from a specific file, falling back to defaults
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::debug!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to a specific file
///
/// Creates the parent directory if it doesn't exist.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[api]"));
        assert!(toml.contains("[polling]"));
        assert!(toml.contains("[views]"));
        assert!(toml.contains("medium_term"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[api]
base_url = "https://feedback.example.com/api"

[views]
stale_data = "discard"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.api.base_url, "https://feedback.example.com/api");
        assert_eq!(config.views.stale_data, StaleDataPolicy::Discard);

        // Other fields use defaults
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.polling.currently_playing_secs, 5);
        assert_eq!(config.polling.dashboard_secs, 60);
        assert_eq!(config.views.history_limit, 50);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.polling.history_secs = 120;
        config.views.default_time_range = TimeRange::LongTerm;
        save_to(&config, &path).unwrap();

        let loaded = load_from(&path);
        assert_eq!(loaded.polling.history_secs, 120);
        assert_eq!(loaded.views.default_time_range, TimeRange::LongTerm);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_unparseable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        let config = load_from(&path);
        assert_eq!(config.api.base_url, "http://localhost:8080/api");
    }

    #[test]
    fn test_timeout_never_zero() {
        let api = ApiConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(api.timeout(), Duration::from_secs(1));
    }
}
