//! Error taxonomy and the normalizer that turns errors into envelopes.
//!
//! # Design
//! `ApiAdapter::request` never hands an `Err` to its caller. Every failure
//! (transport, non-2xx, legacy `status: "error"` payloads, malformed auth
//! responses) is an `AdapterError` first and is then folded into a
//! `NormalizedResponse` by `normalize_error`. The `Display` text of each
//! variant is exactly the `error.message` the UI sees.

use serde_json::Value;

use crate::envelope::NormalizedResponse;

/// Code used when a failure carries no code of its own.
pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";

/// Message used when a failure carries no message of its own.
pub const FALLBACK_MESSAGE: &str = "An unexpected error occurred";

/// Message used when the legacy backend signals an error without a message.
pub const LEGACY_FALLBACK_MESSAGE: &str = "API request failed";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// The request never produced an HTTP response.
    #[error("{message}")]
    Transport { code: Option<String>, message: String },

    /// The legacy backend answered with a non-2xx status.
    #[error("HTTP {status}: {status_text}")]
    Http { status: u16, status_text: String },

    /// HTTP succeeded but the payload signals failure.
    #[error("{message}")]
    Legacy { message: String },

    /// Auth endpoint answered without any recognizable token.
    #[error("Invalid authentication response")]
    InvalidAuthResponse,

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// An error envelope surfaced at the typed boundary of `ApiClient`.
    #[error("{message}")]
    Api { code: String, message: String },
}

impl AdapterError {
    pub fn transport(message: impl Into<String>) -> Self {
        AdapterError::Transport {
            code: None,
            message: message.into(),
        }
    }

    pub fn legacy(message: Option<&str>) -> Self {
        AdapterError::Legacy {
            message: message
                .filter(|m| !m.is_empty())
                .unwrap_or(LEGACY_FALLBACK_MESSAGE)
                .to_string(),
        }
    }

    /// Code reported in the error envelope.
    pub fn code(&self) -> &str {
        match self {
            AdapterError::Transport { code: Some(code), .. } => code,
            AdapterError::Api { code, .. } => code,
            _ => UNKNOWN_ERROR,
        }
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Deserialization(err.to_string())
    }
}

/// Fold an error into the uniform failure envelope.
pub fn normalize_error(error: &AdapterError) -> NormalizedResponse<Value> {
    let message = error.to_string();
    let message = if message.is_empty() {
        FALLBACK_MESSAGE.to_string()
    } else {
        message
    };
    NormalizedResponse::failure(error.code(), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_message_uses_status_and_text() {
        let err = AdapterError::Http {
            status: 503,
            status_text: "Service Unavailable".to_string(),
        };
        let envelope = normalize_error(&err);
        let body = envelope.error.unwrap();
        assert_eq!(body.code, "UNKNOWN_ERROR");
        assert_eq!(body.message, "HTTP 503: Service Unavailable");
        assert!(envelope.data.is_none());
    }

    #[test]
    fn transport_code_is_kept_when_present() {
        let err = AdapterError::Transport {
            code: Some("ECONNREFUSED".to_string()),
            message: "connection refused".to_string(),
        };
        assert_eq!(normalize_error(&err).error.unwrap().code, "ECONNREFUSED");
    }

    #[test]
    fn empty_message_falls_back() {
        let err = AdapterError::transport("");
        let body = normalize_error(&err).error.unwrap();
        assert_eq!(body.message, FALLBACK_MESSAGE);
    }

    #[test]
    fn legacy_error_without_message_uses_generic_text() {
        assert_eq!(AdapterError::legacy(None).to_string(), "API request failed");
        assert_eq!(AdapterError::legacy(Some("")).to_string(), "API request failed");
        assert_eq!(AdapterError::legacy(Some("boom")).to_string(), "boom");
    }

    #[test]
    fn invalid_auth_message_is_fixed() {
        let body = normalize_error(&AdapterError::InvalidAuthResponse).error.unwrap();
        assert_eq!(body.message, "Invalid authentication response");
    }
}
