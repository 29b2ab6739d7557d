//! charla-engine: Headless core for the charla chat front-end
//!
//! This crate provides the non-UI logic for charla, including:
//! - Backend bridge client for Ollama reachability checks and model listing
//! - Connection monitor state consumed by the UI
//! - Settings persistence and environment overrides

pub mod monitor;
pub mod ollama;
pub mod settings;

// Re-export commonly used types
pub use monitor::{ConnectionMonitor, ConnectionState, NOT_CONNECTED_MESSAGE};
pub use ollama::{
    display_label, CheckResponse, ModelsResponse, OllamaClient, OllamaError, OllamaModel,
};
pub use settings::{resolved_backend_url, Settings, SettingsError, DEFAULT_BACKEND_URL};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_version() {
        let version = engine_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
