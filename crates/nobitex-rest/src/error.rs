//! Error types for REST API operations
//!
//! Every failure surfaces as a [`RestError`]. Non-2xx responses are turned
//! into an [`ApiError`] by [`ApiError::from_response`], which accepts any
//! body the exchange may send back.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use nobitex_auth::{AuthError, SessionError};
use serde::Deserialize;
use serde_json::Value;

use crate::transport::TransportError;

/// Errors that can occur during REST API operations
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// Local misconfiguration; raised before any network call
    #[error("Configuration error: {message}")]
    Configuration {
        /// What is missing or invalid
        message: String,
        /// Underlying credential error, if any
        #[source]
        source: Option<AuthError>,
    },

    /// Request could not be built, sent, or read
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// 2xx response whose body does not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// Session has no key for an endpoint that needs one
    #[error("Authentication error: {0}")]
    Authentication(#[from] SessionError),

    /// Exchange answered with a non-2xx status
    #[error("API error ({}): {}", .0.status_code, .0.message)]
    Api(Box<ApiError>),

    /// Re-login after the key went stale did not succeed
    ///
    /// Shared by every caller that waited on the same refresh.
    #[error("Failed to refresh API key: {0}")]
    RefreshFailed(#[source] Arc<RestError>),
}

impl RestError {
    /// Create a configuration error without an underlying cause
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// The error that caused a failed refresh, or `self`
    ///
    /// The kind checks below all look through [`RestError::RefreshFailed`].
    pub fn root_cause(&self) -> &RestError {
        match self {
            Self::RefreshFailed(inner) => inner.root_cause(),
            other => other,
        }
    }

    /// Whether this error came from a failed key refresh
    pub fn is_refresh_failure(&self) -> bool {
        matches!(self, Self::RefreshFailed(_))
    }

    /// Whether this is a local configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self.root_cause(), Self::Configuration { .. })
    }

    /// Whether the transport failed (including per-call timeouts)
    pub fn is_transport(&self) -> bool {
        matches!(self.root_cause(), Self::Transport(_))
    }

    /// Whether the call failed because its deadline elapsed
    pub fn is_timeout(&self) -> bool {
        matches!(self.root_cause(), Self::Transport(e) if e.is_timeout())
    }

    /// Whether a successful response could not be decoded
    pub fn is_decode(&self) -> bool {
        matches!(self.root_cause(), Self::Decode(_))
    }

    /// Whether the session had no key
    pub fn is_authentication(&self) -> bool {
        matches!(self.root_cause(), Self::Authentication(_))
    }

    /// The normalized exchange error, looking through refresh failures
    pub fn api_error(&self) -> Option<&ApiError> {
        match self.root_cause() {
            Self::Api(error) => Some(error),
            _ => None,
        }
    }

    /// HTTP status code of the exchange error, if any
    pub fn status_code(&self) -> Option<u16> {
        self.api_error().map(|e| e.status_code)
    }

    /// Check if this error indicates rate limiting
    pub fn is_rate_limited(&self) -> bool {
        self.status_code() == Some(429)
    }

    /// Check if the exchange rejected the credentials or key
    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }
}

impl From<AuthError> for RestError {
    fn from(error: AuthError) -> Self {
        Self::Configuration {
            message: error.to_string(),
            source: Some(error),
        }
    }
}

impl From<ApiError> for RestError {
    fn from(error: ApiError) -> Self {
        Self::Api(Box::new(error))
    }
}

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

// ============================================================================
// Error normalization
// ============================================================================

/// String form of one top-level key of an error body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Scalar or object rendered as text
    Text(String),
    /// Array rendered element by element
    List(Vec<String>),
}

impl FieldValue {
    /// Values as a flat list; a single text becomes a one-element list
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Text(text) => vec![text.as_str()],
            Self::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// The text value, if this is not a list
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::List(_) => None,
        }
    }

    fn from_json(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self::List(items.iter().map(value_to_text).collect()),
            other => Self::Text(value_to_text(other)),
        }
    }
}

/// Strings verbatim, everything else as compact JSON
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Documented error shape; fields of the wrong type are treated as absent
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, deserialize_with = "lenient_string")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    message: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    detail: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    })
}

/// Structured form of any non-2xx response
///
/// `message` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// `status` field, usually `"failed"`
    pub status: Option<String>,
    /// Machine-readable `code`
    pub code: Option<String>,
    /// Human-readable message
    pub message: String,
    /// `detail` field, sent by some endpoints instead of `message`
    pub detail: Option<String>,
    /// HTTP status code
    pub status_code: u16,
    /// Every top-level key of the body, stringified
    pub fields: BTreeMap<String, FieldValue>,
}

impl ApiError {
    /// Normalize a raw response body
    ///
    /// Total: empty, non-JSON, and non-object bodies all yield a valid error.
    pub fn from_response(status_code: u16, body: &[u8]) -> Self {
        let object = serde_json::from_slice::<serde_json::Map<String, Value>>(body).ok();

        let known: ErrorBody = object
            .as_ref()
            .and_then(|map| serde_json::from_value(Value::Object(map.clone())).ok())
            .unwrap_or_default();

        let fields: BTreeMap<String, FieldValue> = object
            .iter()
            .flatten()
            .map(|(key, value)| (key.clone(), FieldValue::from_json(value)))
            .collect();

        let detail = known.detail;
        let message = known
            .message
            .or_else(|| detail.clone())
            .unwrap_or_else(|| format!("API error ({})", status_code));

        Self {
            status: known.status,
            code: known.code,
            message,
            detail,
            status_code,
            fields,
        }
    }

    /// Look up a captured top-level field
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({}): {}", self.status_code, code, self.message),
            None => write!(f, "{}: {}", self.status_code, self.message),
        }
    }
}

impl std::error::Error for ApiError {}
