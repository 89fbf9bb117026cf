//! Persistent settings for the dashboard app.

use crate::api::DEFAULT_API_BASE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the saved API base URL.
pub const API_URL_ENV: &str = "SESSION_FLOW_API_URL";

/// All persistable settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Page the navigation history starts on.
    #[serde(default = "default_page_path")]
    pub page_path: String,
    #[serde(default = "default_organization_slug")]
    pub organization_slug: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_organization_slug() -> String {
    "sentry".to_string()
}

fn default_page_path() -> String {
    format!("/organizations/{}/experience/", default_organization_slug())
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            page_path: default_page_path(),
            organization_slug: default_organization_slug(),
        }
    }
}

impl Settings {
    /// Get the path to the settings file
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("session-flow");
            p.push("settings.json");
            p
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Load settings from disk, returning defaults if file doesn't exist or is invalid
    pub fn load() -> Self {
        let mut settings = match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::warn!("Could not determine config directory, using defaults");
                Self::default()
            }
        };
        settings.apply_env_override(std::env::var(API_URL_ENV).ok());
        settings
    }

    fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse settings file: {}, using defaults", e);
                Self::default()
            }),
            // File doesn't exist yet, that's fine
            Err(_) => Self::default(),
        }
    }

    fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    fn apply_env_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            tracing::info!("Using API base URL from {}: {}", API_URL_ENV, url);
            self.api_base_url = url;
        }
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            tracing::warn!("Could not determine config directory, settings not saved");
            return;
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create config directory: {}", e);
                return;
            }
        }

        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    tracing::warn!("Failed to write settings file: {}", e);
                } else {
                    tracing::info!("Saved settings to {:?}", path);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to serialize settings: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings = Settings::parse(r#"{"api_base_url": "http://koa:4000"}"#).unwrap();
        assert_eq!(settings.api_base_url, "http://koa:4000");
        assert_eq!(settings.request_timeout_secs, 30);
        assert_eq!(settings.organization_slug, "sentry");
    }

    #[test]
    fn test_env_override() {
        let mut settings = Settings::default();
        settings.apply_env_override(Some("  ".into()));
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE);
        settings.apply_env_override(Some("http://override".into()));
        assert_eq!(settings.api_base_url, "http://override");
    }

    #[test]
    fn test_timeout_has_one_second_floor() {
        let settings = Settings::parse(r#"{"request_timeout_secs": 0}"#).unwrap();
        assert_eq!(settings.request_timeout(), Duration::from_secs(1));
    }
}
