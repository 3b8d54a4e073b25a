//! Global JSON body parsing.
//!
//! Runs before routing, so a malformed JSON payload is rejected with
//! `400 Bad Request` before any handler (or the 404 fallback) sees the
//! request. Only requests declaring a JSON content type are inspected:
//!
//! - Empty body: passed through untouched
//! - Body over the configured limit: `413 Payload Too Large`
//! - Not valid JSON, or not an object/array: `400 Bad Request`
//! - Otherwise the parsed document is stored as [`ParsedBody`] and the raw
//!   bytes are put back on the request
//!
//! Handlers read the document through the [`JsonBody`] extractor.

use std::error::Error as _;
use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use http_body_util::LengthLimitError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{AppError, AppResult, sanitize_serde_error};

/// JSON document parsed from the request body.
#[derive(Debug, Clone)]
pub struct ParsedBody(Arc<Value>);

impl ParsedBody {
    pub fn value(&self) -> &Value {
        &self.0
    }
}

/// Middleware that parses JSON request bodies up to `limit` bytes.
///
/// Install with `axum::middleware::from_fn_with_state(limit, parse_json_body)`.
pub async fn parse_json_body(
    State(limit): State<usize>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    if !is_json_content_type(request.headers()) {
        return Ok(next.run(request).await);
    }

    let (mut parts, body) = request.into_parts();

    let bytes = to_bytes(body, limit).await.map_err(|e| {
        if is_length_limit_error(&e) {
            AppError::PayloadTooLarge(format!("Request body exceeds {limit} bytes"))
        } else {
            AppError::BadRequest("Failed to read request body".to_string())
        }
    })?;

    if !bytes.is_empty() {
        let value: Value = serde_json::from_slice(&bytes)?;
        if !(value.is_object() || value.is_array()) {
            return Err(AppError::BadRequest(
                "Request body must be a JSON object or array".to_string(),
            ));
        }
        debug!(bytes = bytes.len(), "Parsed JSON request body");
        parts.extensions.insert(ParsedBody(Arc::new(value)));
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// `application/json` or any `application/*+json` type, parameters ignored.
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

fn is_length_limit_error(error: &axum::Error) -> bool {
    let mut source = error.source();
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Extractor deserializing the body parsed by [`parse_json_body`].
///
/// Fails with `400 Bad Request` when there is no JSON body or it does not
/// match `T`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequestParts<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let parsed = parts.extensions.get::<ParsedBody>().ok_or_else(|| {
            AppError::BadRequest("Expected a JSON request body".to_string())
        })?;

        <T as serde::Deserialize>::deserialize(parsed.value())
            .map(JsonBody)
            .map_err(|e| AppError::BadRequest(sanitize_serde_error(&e)))
    }
}
