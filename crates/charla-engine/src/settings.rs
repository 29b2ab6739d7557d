//! Settings for the charla front-end.
//!
//! Persisted as JSON; the backend base URL can additionally be overridden
//! through the `CHARLA_BACKEND_URL` environment variable.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default backend base URL when nothing is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";

/// Environment variable overriding the backend base URL.
pub const BACKEND_URL_ENV: &str = "CHARLA_BACKEND_URL";

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.into()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".into()
}

fn default_ollama_enabled() -> bool {
    true
}

/// Resolve the backend base URL from the environment, falling back to the
/// built-in default.
pub fn resolved_backend_url() -> String {
    std::env::var(BACKEND_URL_ENV).unwrap_or_else(|_| default_backend_url())
}

/// User-facing settings for charla.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Backend base URL the bridge client talks to.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Address of the Ollama endpoint to monitor.
    #[serde(default = "default_ollama_endpoint")]
    pub ollama_endpoint: String,

    /// Whether Ollama monitoring is enabled at all.
    #[serde(default = "default_ollama_enabled")]
    pub ollama_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            ollama_endpoint: default_ollama_endpoint(),
            ollama_enabled: default_ollama_enabled(),
        }
    }
}

impl Settings {
    /// Backend base URL to use: the environment override wins, otherwise
    /// the configured value.
    pub fn resolve_backend_url(&self) -> String {
        std::env::var(BACKEND_URL_ENV).unwrap_or_else(|_| self.backend_url.clone())
    }

    /// Load settings from a file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(SettingsError::Io)?;
        serde_json::from_str(&content).map_err(SettingsError::Parse)
    }

    /// Save settings to a file.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let content = serde_json::to_string_pretty(self).map_err(SettingsError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(SettingsError::Io)?;
        }
        std::fs::write(path, content).map_err(SettingsError::Io)
    }
}

/// Errors that can occur when working with settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// I/O error reading or writing settings.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing settings JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing settings to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(settings.ollama_endpoint, "http://localhost:11434");
        assert!(settings.ollama_enabled);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"ollama_enabled": false}"#).unwrap();
        assert!(!settings.ollama_enabled);
        assert_eq!(settings.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.ollama_endpoint = "http://10.0.0.5:11434".into();
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }
}
