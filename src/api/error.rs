//! Errors surfaced by the HTTP layer.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("API error {status}")]
    Status { status: u16, detail: Option<String> },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Error body shape returned by the backend (`{"detail": "..."}`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

impl ApiError {
    /// Build a status error, pulling `detail` out of a JSON body when present.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail);
        ApiError::Status { status, detail }
    }

    /// Short user-facing message, if the failure carried one.
    ///
    /// Only backend-provided details are shown in the panel; transport
    /// failures render as an empty panel.
    pub fn detail(&self) -> Option<String> {
        match self {
            ApiError::Request(_) => None,
            ApiError::Status { detail, .. } => detail.clone(),
            ApiError::Malformed(reason) => Some(format!("Malformed response: {}", reason)),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_extracts_detail() {
        let err = ApiError::from_status(400, r#"{"detail": "Invalid query"}"#);
        assert_eq!(err.detail(), Some("Invalid query".to_string()));
    }

    #[test]
    fn status_error_without_json_has_no_detail() {
        let err = ApiError::from_status(502, "<html>Bad Gateway</html>");
        assert_eq!(err.detail(), None);
        assert_eq!(err.to_string(), "API error 502");
    }

    #[test]
    fn transport_error_has_no_detail() {
        assert_eq!(ApiError::Request("connection refused".into()).detail(), None);
    }
}
