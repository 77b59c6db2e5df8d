//! Errors surfaced by the backend client.

use serde::Deserialize;

/// Anything that can go wrong talking to the study backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport failure: connection refused, reset mid-body, and so on.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}{}", .detail.as_deref().map(|d| format!(": {}", d)).unwrap_or_default())]
    Status {
        status: u16,
        detail: Option<String>,
    },

    /// The body did not have the shape we expected.
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reading a local document before upload.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl ApiError {
    /// Build a status error, keeping a string `detail` from the body if there is one.
    pub fn from_status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            detail: extract_detail(body),
        }
    }

    /// The message a user should see: the backend's `detail` verbatim, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Only a plain string counts; validation errors carry arrays we can't show as-is.
pub fn extract_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
