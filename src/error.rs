//! Application error taxonomy and the error envelope renderer.
//!
//! Every failure inside the pipeline is an [`AppError`]. Its
//! [`IntoResponse`] implementation is the only place where an error becomes
//! an HTTP response, always with the envelope:
//!
//! ```json
//! { "error": { "message": "Not Found", "status": 404 } }
//! ```
//!
//! The `status` field always equals the HTTP status code of the response.

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Closed set of error kinds, each with a default status and message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Unauthorized,
    PayloadTooLarge,
    UpstreamFailure,
    Internal,
}

impl ErrorKind {
    /// HTTP status associated with this kind.
    pub fn status(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UpstreamFailure | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message used when none is supplied at construction.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::NotFound => "Not Found",
            Self::BadRequest => "Bad Request",
            Self::Unauthorized => "Unauthorized",
            Self::PayloadTooLarge => "Payload Too Large",
            Self::UpstreamFailure | Self::Internal => "Internal Server Error",
        }
    }
}

/// Application-wide error type.
///
/// Client-facing kinds (`NotFound`, `BadRequest`, `Unauthorized`,
/// `PayloadTooLarge`) render their message as-is. Server-side kinds
/// (`Upstream`, `Internal`, `Config`) carry detail for the logs only; the
/// client always sees the default message for the kind.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Build an error of `kind`, falling back to the kind's default message.
pub fn make_error(kind: ErrorKind, message: Option<&str>) -> AppError {
    let message = message
        .map(str::to_string)
        .unwrap_or_else(|| kind.default_message().to_string());

    match kind {
        ErrorKind::NotFound => AppError::NotFound(message),
        ErrorKind::BadRequest => AppError::BadRequest(message),
        ErrorKind::Unauthorized => AppError::Unauthorized(message),
        ErrorKind::PayloadTooLarge => AppError::PayloadTooLarge(message),
        ErrorKind::UpstreamFailure => AppError::Upstream(message),
        ErrorKind::Internal => AppError::Internal(message),
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::PayloadTooLarge(_) => ErrorKind::PayloadTooLarge,
            Self::Upstream(_) => ErrorKind::UpstreamFailure,
            Self::Internal(_) | Self::ConfigError(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind().status()
    }

    /// The message shown to clients.
    pub fn public_message(&self) -> &str {
        match self {
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Unauthorized(msg)
            | Self::PayloadTooLarge(msg) => msg,
            Self::Upstream(_) | Self::Internal(_) | Self::ConfigError(_) => {
                self.kind().default_message()
            }
        }
    }
}

/// Wire shape of the error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    status: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let envelope = ErrorEnvelope {
            error: ErrorBody {
                message: self.public_message(),
                status: status.as_u16(),
            },
        };

        (status, axum::Json(envelope)).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::BadRequest(sanitize_serde_error(&e))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Sanitize serde error messages to avoid leaking internal type information.
///
/// Serde errors can contain internal struct/field names which shouldn't be
/// exposed to external clients. This keeps only the parts useful to a caller.
pub(crate) fn sanitize_serde_error(e: &serde_json::Error) -> String {
    let msg = e.to_string();

    if let Some(field) = backticked(&msg, "missing field") {
        return format!("Missing required field: {field}");
    }

    if let Some(field) = backticked(&msg, "unknown field") {
        return format!("Unknown field: {field}");
    }

    if msg.contains("unknown variant") {
        return "Unsupported value in request body".to_string();
    }

    if msg.contains("invalid type") {
        return "Invalid data type in request body".to_string();
    }

    if e.is_syntax() || e.is_eof() {
        return "Malformed JSON in request body".to_string();
    }

    "Invalid request format".to_string()
}

fn backticked<'a>(msg: &'a str, marker: &str) -> Option<&'a str> {
    if !msg.contains(marker) {
        return None;
    }
    let (_, rest) = msg.split_once('`')?;
    let (field, _) = rest.split_once('`')?;
    Some(field)
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
