//! Connection monitor for the configured Ollama endpoint.
//!
//! Tracks reachability and the available model list as seen through the
//! backend bridge. The UI consumes [`ConnectionState`] to gate affordances;
//! refreshes are manual (no automatic retry).

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::ollama::{CheckResponse, OllamaClient, OllamaError, OllamaModel};

/// Fixed message shown when the endpoint answered but reported itself
/// unreachable without an error of its own.
pub const NOT_CONNECTED_MESSAGE: &str = "No se pudo conectar con el endpoint de Ollama";

/// Snapshot of the monitored connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionState {
    /// Whether the Ollama endpoint was reachable at the last check.
    pub is_connected: bool,
    /// True while a request is in flight.
    pub is_loading: bool,
    /// Models available on the endpoint, in server order.
    pub models: Vec<OllamaModel>,
    /// Error from the most recent failed request, cleared on each new one.
    pub error: Option<String>,
    /// When the endpoint was last checked.
    pub last_checked: Option<DateTime<Utc>>,
}

impl ConnectionState {
    /// Reset to the initial disconnected state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fold a reachability check result into the state.
    fn apply_check(&mut self, result: Result<CheckResponse, OllamaError>) {
        match result {
            Ok(body) => {
                self.is_connected = body.is_connected;
                if !body.is_connected {
                    self.error = Some(NOT_CONNECTED_MESSAGE.into());
                }
            }
            Err(err) => {
                warn!(error = %err, "Ollama reachability check failed");
                self.is_connected = false;
                self.error = Some(err.to_string());
            }
        }
        self.last_checked = Some(Utc::now());
    }

    /// Fold a model listing result into the state.
    fn apply_models(&mut self, result: Result<Vec<OllamaModel>, OllamaError>) {
        match result {
            Ok(models) => {
                self.models = models;
                self.is_connected = true;
            }
            Err(err) => {
                warn!(error = %err, "Ollama model listing failed");
                self.is_connected = false;
                self.models.clear();
                self.error = Some(err.to_string());
            }
        }
    }
}

/// Monitors one Ollama endpoint through the backend bridge.
///
/// Cheap to clone: callers that need a refresh off the UI thread clone the
/// monitor, await [`ConnectionMonitor::refresh`] on the clone and write the
/// resulting state back (later writers win, by design).
#[derive(Debug, Clone)]
pub struct ConnectionMonitor {
    client: OllamaClient,
    endpoint: String,
    enabled: bool,
    state: ConnectionState,
}

impl ConnectionMonitor {
    /// Create a monitor for the given endpoint.
    pub fn new(client: OllamaClient, endpoint: impl Into<String>, enabled: bool) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            enabled,
            state: ConnectionState::default(),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// The monitored endpoint address.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether monitoring is enabled.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Change the monitored endpoint. Resets the state when it differs.
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        let endpoint = endpoint.into();
        if endpoint != self.endpoint {
            self.endpoint = endpoint;
            self.state.reset();
        }
    }

    /// Enable or disable monitoring. Resets the state when it changes.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled != self.enabled {
            self.enabled = enabled;
            self.state.reset();
        }
    }

    /// Overwrite the state with one produced by a background refresh.
    pub fn replace_state(&mut self, state: ConnectionState) {
        self.state = state;
    }

    fn ready(&self) -> bool {
        self.enabled && !self.endpoint.is_empty()
    }

    /// Check whether the endpoint is reachable. Issues no request when
    /// monitoring is disabled or the endpoint is unset.
    pub async fn check_connection(&mut self) {
        if !self.ready() {
            self.state.is_connected = false;
            return;
        }

        self.state.is_loading = true;
        self.state.error = None;

        let result = self.client.check(&self.endpoint).await;
        self.state.apply_check(result);
        self.state.is_loading = false;
    }

    /// Fetch the model list. Issues no request when monitoring is disabled
    /// or the endpoint is unset.
    pub async fn fetch_models(&mut self) {
        if !self.ready() {
            self.state.models.clear();
            self.state.is_connected = false;
            return;
        }

        self.state.is_loading = true;
        self.state.error = None;

        let result = self.client.models(&self.endpoint).await;
        self.state.apply_models(result);
        self.state.is_loading = false;
    }

    /// Full refresh: one reachability check followed by one model listing.
    pub async fn refresh(&mut self) {
        self.check_connection().await;
        self.fetch_models().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_ok(is_connected: bool) -> Result<CheckResponse, OllamaError> {
        Ok(CheckResponse {
            is_connected,
            error: None,
        })
    }

    #[test]
    fn test_apply_check_connected() {
        let mut state = ConnectionState::default();
        state.apply_check(check_ok(true));

        assert!(state.is_connected);
        assert!(state.error.is_none());
        assert!(state.last_checked.is_some());
    }

    #[test]
    fn test_apply_check_not_connected_synthesizes_message() {
        let mut state = ConnectionState::default();
        state.apply_check(check_ok(false));

        assert!(!state.is_connected);
        assert_eq!(state.error.as_deref(), Some(NOT_CONNECTED_MESSAGE));
    }

    #[test]
    fn test_apply_check_failure_surfaces_error() {
        let mut state = ConnectionState::default();
        state.apply_check(Err(OllamaError::Status(500)));

        assert!(!state.is_connected);
        assert_eq!(state.error.as_deref(), Some("HTTP error! status: 500"));
    }

    #[test]
    fn test_apply_models_success_marks_connected() {
        let mut state = ConnectionState::default();
        state.apply_models(Ok(vec![
            OllamaModel::new("llama2"),
            OllamaModel::new("mixtral-8x7b"),
        ]));

        assert!(state.is_connected);
        let labels: Vec<&str> = state.models.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["Llama2", "Mixtral 8x7b"]);
    }

    #[test]
    fn test_apply_models_failure_clears_list() {
        let mut state = ConnectionState {
            models: vec![OllamaModel::new("llama2")],
            is_connected: true,
            ..ConnectionState::default()
        };
        state.apply_models(Err(OllamaError::Api("endpoint down".into())));

        assert!(!state.is_connected);
        assert!(state.models.is_empty());
        assert_eq!(state.error.as_deref(), Some("endpoint down"));
    }

    #[tokio::test]
    async fn test_disabled_monitor_issues_no_requests() {
        // Unresolvable backend on purpose: a request would fail loudly, but
        // a disabled monitor must short-circuit before any I/O.
        let client = OllamaClient::new("http://charla.invalid");
        let mut monitor = ConnectionMonitor::new(client, "http://localhost:11434", false);

        monitor.refresh().await;

        assert!(!monitor.state().is_connected);
        assert!(monitor.state().models.is_empty());
        assert!(monitor.state().error.is_none());
        assert!(!monitor.state().is_loading);
    }

    #[tokio::test]
    async fn test_empty_endpoint_issues_no_requests() {
        let client = OllamaClient::new("http://charla.invalid");
        let mut monitor = ConnectionMonitor::new(client, "", true);

        monitor.check_connection().await;
        monitor.fetch_models().await;

        assert_eq!(monitor.state(), &ConnectionState::default());
    }

    #[test]
    fn test_set_endpoint_resets_state() {
        let client = OllamaClient::new("http://charla.invalid");
        let mut monitor = ConnectionMonitor::new(client, "http://a:11434", true);
        monitor.replace_state(ConnectionState {
            is_connected: true,
            models: vec![OllamaModel::new("llama2")],
            ..ConnectionState::default()
        });

        monitor.set_endpoint("http://b:11434");

        assert_eq!(monitor.state(), &ConnectionState::default());
        assert_eq!(monitor.endpoint(), "http://b:11434");
    }

    #[test]
    fn test_set_enabled_unchanged_keeps_state() {
        let client = OllamaClient::new("http://charla.invalid");
        let mut monitor = ConnectionMonitor::new(client, "http://a:11434", true);
        monitor.replace_state(ConnectionState {
            is_connected: true,
            ..ConnectionState::default()
        });

        monitor.set_enabled(true);
        assert!(monitor.state().is_connected);

        monitor.set_enabled(false);
        assert_eq!(monitor.state(), &ConnectionState::default());
    }
}
