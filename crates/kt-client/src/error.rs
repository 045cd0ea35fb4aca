//! Error types for kintone-client.
//!
//! Two shapes exist. [`Error`] is the raw transport error surfaced unchanged by
//! the JSON path. [`ApiError`] is the normalized error every file-transfer
//! failure is wrapped in.

use serde::Deserialize;

/// Result type alias for kintone-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for kintone-client operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if the TLS material failed validation before dispatch.
    pub fn is_tls_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Tls(_))
    }

    /// Returns the HTTP status if the server answered with a non-success code.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Client certificate or proxy TLS material could not be turned into a
    /// secure context.
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// Server answered with a non-success status. `message` holds the body.
    #[error("HTTP error: {status} {message}")]
    Http { status: u16, message: String },

    /// Request timeout.
    #[error("Request timeout")]
    Timeout,

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Unrecognised HTTP method name.
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            ErrorKind::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            ErrorKind::Json(err.to_string())
        } else {
            ErrorKind::Other(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidUrl(err.to_string()), err)
    }
}

/// Error body returned by the kintone REST API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorResponse {
    /// Request id assigned by the server.
    #[serde(default)]
    pub id: Option<String>,
    /// Service error code, e.g. `GAIA_RE01`.
    #[serde(default)]
    pub code: Option<String>,
    /// Human readable message.
    #[serde(default)]
    pub message: String,
    /// Per-field validation errors, kept as the server sent them.
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

/// Normalized failure of a file transfer.
///
/// Wraps the raw [`Error`] and, when the server returned a kintone error
/// document, exposes it already parsed.
#[derive(Debug, thiserror::Error)]
#[error("kintone API error{}: {}", .status.map(|s| format!(" ({s})")).unwrap_or_default(), .response.message)]
pub struct ApiError {
    /// HTTP status, if the failure came from a server response.
    pub status: Option<u16>,
    /// Parsed error body, or a message-only body for non-HTTP failures.
    pub response: ErrorResponse,
    /// The underlying transport or TLS error.
    #[source]
    pub source: Error,
}

impl ApiError {
    /// Error code reported by the service, if any.
    pub fn code(&self) -> Option<&str> {
        self.response.code.as_deref()
    }

    /// The wrapped raw error.
    pub fn inner(&self) -> &Error {
        &self.source
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = err.status();
        let parsed = match &err.kind {
            ErrorKind::Http { message, .. } => serde_json::from_str::<ErrorResponse>(message)
                .ok()
                .filter(|r| !r.message.is_empty() || r.code.is_some()),
            _ => None,
        };
        let response = parsed.unwrap_or_else(|| ErrorResponse {
            message: err.to_string(),
            ..ErrorResponse::default()
        });

        Self {
            status,
            response,
            source: err,
        }
    }
}
