//! Backend error types

use serde::Deserialize;

/// Error returned by a backend call
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message} (status: {status}){}", format_details(.details))]
    Api {
        status: u16,
        message: String,
        details: Option<String>,
    },

    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

fn format_details(details: &Option<String>) -> String {
    details
        .as_deref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

/// Error body returned by the console API
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiErrorBody {
    message: String,
    details: Option<String>,
}

impl BackendError {
    /// Build an API error from a non-success response body
    ///
    /// Falls back to `fallback` when the body carries no message.
    pub fn from_response(status: u16, body: &str, fallback: &str) -> Self {
        let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = if parsed.message.is_empty() {
            fallback.to_string()
        } else {
            parsed.message
        };
        let details = parsed.details.filter(|d| !d.is_empty()).or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && serde_json::from_str::<serde_json::Value>(trimmed).is_err())
                .then(|| trimmed.to_string())
        });

        BackendError::Api {
            status,
            message,
            details,
        }
    }
}
