use axum::http::{Method, Uri};
use tracing::debug;

use crate::error::{AppError, ErrorKind, make_error};

/// Catch-all for anything no route matched.
pub async fn not_found(method: Method, uri: Uri) -> AppError {
    debug!(%method, path = uri.path(), "No route matched");
    make_error(ErrorKind::NotFound, None)
}
