//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its target URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// Answers `301 Moved Permanently` with the target in `Location`.
///
/// # Errors
///
/// - 400 for a malformed code
/// - 404 if the link does not exist or has expired
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let link = state.link_service.get_by_code(&code).await?;
    tracing::debug!(code = %link.code, "Redirecting");

    Ok((
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, link.long_url)],
    ))
}
