//! Backend bridge client for Ollama.
//!
//! The charla backend proxies two operations against a user-configured
//! Ollama endpoint: a reachability check and a model listing. Both are
//! plain JSON POSTs carrying the endpoint under test in the body.

use serde::{Deserialize, Serialize};

use crate::settings::resolved_backend_url;

/// Request body shared by both bridge routes.
#[derive(Debug, Serialize)]
struct EndpointRequest<'a> {
    endpoint: &'a str,
}

/// Response of `POST /api/agent/ollama/check`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckResponse {
    /// Whether the backend could reach the Ollama endpoint.
    pub is_connected: bool,
    /// Application-level error message, if any.
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `POST /api/agent/ollama/models`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsResponse {
    /// Raw model names in server order.
    #[serde(default)]
    pub models: Vec<String>,
    /// Application-level error message, if any.
    #[serde(default)]
    pub error: Option<String>,
}

/// A model available on the monitored endpoint, with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaModel {
    /// Raw model name as reported by the server (e.g. "mixtral-8x7b").
    pub name: String,
    /// Human-friendly label (e.g. "Mixtral 8x7b").
    pub label: String,
}

impl OllamaModel {
    /// Create a model entry, deriving the display label from the raw name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let label = display_label(&name);
        Self { name, label }
    }
}

/// Derive a display label from a raw model name: the first character is
/// uppercased and every `.` or `-` in the remainder becomes a space.
pub fn display_label(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut label: String = first.to_uppercase().collect();
    label.extend(chars.map(|c| if c == '.' || c == '-' { ' ' } else { c }));
    label
}

/// Errors from talking to the backend bridge.
#[derive(Debug, thiserror::Error)]
pub enum OllamaError {
    /// Transport-level failure (connection refused, DNS, malformed URL...).
    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success HTTP status.
    #[error("HTTP error! status: {0}")]
    Status(u16),

    /// Backend answered 2xx but the body carried an error message.
    #[error("{0}")]
    Api(String),
}

/// HTTP client for the backend's Ollama bridge routes.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    backend_url: String,
}

impl OllamaClient {
    /// Create a client against the given backend base URL.
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            backend_url: backend_url.into(),
        }
    }

    /// Create a client against the environment-resolved backend URL.
    pub fn from_env() -> Self {
        Self::new(resolved_backend_url())
    }

    /// The backend base URL this client talks to.
    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    fn route(&self, path: &str) -> String {
        format!("{}{path}", self.backend_url.trim_end_matches('/'))
    }

    /// Ask the backend whether the Ollama endpoint is reachable.
    pub async fn check(&self, endpoint: &str) -> Result<CheckResponse, OllamaError> {
        let url = self.route("/api/agent/ollama/check");
        tracing::debug!(%url, endpoint, "checking Ollama reachability");

        let response = self
            .http
            .post(&url)
            .json(&EndpointRequest { endpoint })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OllamaError::Status(status.as_u16()));
        }

        let mut body: CheckResponse = response.json().await?;
        if let Some(message) = body.error.take() {
            return Err(OllamaError::Api(message));
        }
        Ok(body)
    }

    /// List the models available on the Ollama endpoint.
    pub async fn models(&self, endpoint: &str) -> Result<Vec<OllamaModel>, OllamaError> {
        let url = self.route("/api/agent/ollama/models");
        tracing::debug!(%url, endpoint, "fetching Ollama models");

        let response = self
            .http
            .post(&url)
            .json(&EndpointRequest { endpoint })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OllamaError::Status(status.as_u16()));
        }

        let mut body: ModelsResponse = response.json().await?;
        if let Some(message) = body.error.take() {
            return Err(OllamaError::Api(message));
        }
        Ok(body.models.into_iter().map(OllamaModel::new).collect())
    }
}
