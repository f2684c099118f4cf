use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// The caller supplied input that fails a precondition (missing idea,
    /// prompt or image reference).
    #[error("{0}")]
    InvalidRequest(String),
    /// The provider responded with a non-success status, or did not respond
    /// before the request timeout.
    #[error("Upstream error: {0}")]
    Upstream(String),
    /// Anything unexpected while handling the request, including a response
    /// body that could not be parsed into the expected shape.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Build an upstream error from the provider's status and error body.
    #[must_use]
    pub fn upstream(provider: &str, status: StatusCode, body: &str) -> Self {
        let status_text = status.canonical_reason().unwrap_or("Unknown Status");
        let body = body.trim();
        if body.is_empty() {
            Self::Upstream(format!("{provider} API error: {status_text} ({status})"))
        } else {
            Self::Upstream(format!(
                "{provider} API error: {status_text} ({status}) - {body}"
            ))
        }
    }

    /// HTTP status used when this error crosses the endpoint boundary.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Upstream(format!("request timed out: {error}"))
        } else if error.is_decode() {
            Self::Internal(format!("malformed response body: {error}"))
        } else {
            Self::Internal(error.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        Self::Internal(format!("malformed JSON: {error}"))
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_carries_status_text_and_body() {
        let error = GatewayError::upstream(
            "Grok",
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":"rate limited"}"#,
        );
        let message = error.to_string();
        assert!(message.contains("Too Many Requests"));
        assert!(message.contains("rate limited"));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_request_maps_to_bad_request() {
        let error = GatewayError::InvalidRequest("Idea text is required".to_string());
        assert_eq!(error.to_string(), "Idea text is required");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }
}
