//! API-specific error types
//!
//! Provides the caller-visible error taxonomy for backend calls. Backend
//! failures keep their status, the backend's human-readable message and the raw
//! payload so that callers can render them unchanged.

use std::time::Duration;

use dropdoko_domain::DropDokoError;
use serde_json::Value;
use thiserror::Error;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// No response was received (connection failure, timeout)
    Network,
    /// Authorization failed after the single post-refresh retry
    AuthExpired,
    /// Credential refresh failed and the session was torn down
    SessionTerminated,
    /// Backend 5xx
    Server,
    /// Backend 4xx carrying a domain-level message
    Domain,
    /// Client construction, request building or response decoding
    Config,
}

/// API operation errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Session terminated: {0}")]
    SessionTerminated(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String, payload: Option<Value> },

    #[error("Request rejected ({status}): {message}")]
    Domain { status: u16, message: String, payload: Option<Value> },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Unauthorized(_) => ApiErrorCategory::AuthExpired,
            Self::SessionTerminated(_) => ApiErrorCategory::SessionTerminated,
            Self::Server { .. } => ApiErrorCategory::Server,
            Self::Domain { .. } => ApiErrorCategory::Domain,
            Self::Decode(_) | Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// HTTP status of the backend response, when there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } | Self::Domain { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(401),
            _ => None,
        }
    }

    /// Backend-provided message for server and domain errors
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Server { message, .. } | Self::Domain { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Raw JSON payload of the backend response, if it was JSON
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Server { payload, .. } | Self::Domain { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }

    /// Whether the caller should send the user back through login
    pub fn requires_login(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::AuthExpired | ApiErrorCategory::SessionTerminated
        )
    }

    /// Build a server or domain error from a non-success response body.
    ///
    /// 5xx statuses become [`ApiError::Server`], everything else
    /// [`ApiError::Domain`].
    pub fn from_response(status: u16, body: &str) -> Self {
        let payload = serde_json::from_str::<Value>(body).ok();
        let message = extract_message(payload.as_ref(), body, status);

        if (500..600).contains(&status) {
            Self::Server { status, message, payload }
        } else {
            Self::Domain { status, message, payload }
        }
    }
}

/// Prefer the JSON `message` field, then `error`, then the raw body text.
fn extract_message(payload: Option<&Value>, body: &str, status: u16) -> String {
    let from_json = payload.and_then(|value| {
        ["message", "error"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
    });

    match from_json {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => format!("request failed with status {status}"),
    }
}

/// Convert from DropDokoError to ApiError
impl From<DropDokoError> for ApiError {
    fn from(err: DropDokoError) -> Self {
        match err {
            DropDokoError::Network(message) => Self::Network(message),
            DropDokoError::Auth(message) => Self::Unauthorized(message),
            DropDokoError::Config(message) | DropDokoError::InvalidInput(message) => {
                Self::Config(message)
            }
            DropDokoError::Storage(message)
            | DropDokoError::NotFound(message)
            | DropDokoError::Internal(message) => Self::Config(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(ApiError::Network("down".into()).category(), ApiErrorCategory::Network);
        assert_eq!(
            ApiError::Timeout(Duration::from_secs(1)).category(),
            ApiErrorCategory::Network
        );
        assert_eq!(
            ApiError::Unauthorized("expired".into()).category(),
            ApiErrorCategory::AuthExpired
        );
        assert_eq!(
            ApiError::SessionTerminated("refresh failed".into()).category(),
            ApiErrorCategory::SessionTerminated
        );
        assert_eq!(ApiError::from_response(502, "").category(), ApiErrorCategory::Server);
        assert_eq!(ApiError::from_response(409, "").category(), ApiErrorCategory::Domain);
    }

    #[test]
    fn test_message_prefers_message_field() {
        let body = json!({ "message": "Invalid credentials", "error": "AUTH" }).to_string();
        let err = ApiError::from_response(401, &body);

        assert_eq!(err.backend_message(), Some("Invalid credentials"));
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.payload().and_then(|p| p.get("error")), Some(&json!("AUTH")));
    }

    #[test]
    fn test_message_falls_back_to_error_field_then_text() {
        let err = ApiError::from_response(400, r#"{"error":"Coupon expired"}"#);
        assert_eq!(err.backend_message(), Some("Coupon expired"));

        let err = ApiError::from_response(503, "upstream unavailable\n");
        assert_eq!(err.backend_message(), Some("upstream unavailable"));
        assert!(err.payload().is_none());

        let err = ApiError::from_response(500, "");
        assert_eq!(err.backend_message(), Some("request failed with status 500"));
    }

    #[test]
    fn test_requires_login() {
        assert!(ApiError::Unauthorized("x".into()).requires_login());
        assert!(ApiError::SessionTerminated("x".into()).requires_login());
        assert!(!ApiError::from_response(401, "bad password").requires_login());
        assert!(!ApiError::Network("x".into()).requires_login());
    }

    #[test]
    fn test_domain_error_conversion() {
        let err: ApiError = DropDokoError::Network("refused".into()).into();
        assert!(matches!(err, ApiError::Network(_)));

        let err: ApiError = DropDokoError::InvalidInput("bad header".into()).into();
        assert_eq!(err.category(), ApiErrorCategory::Config);
    }
}
