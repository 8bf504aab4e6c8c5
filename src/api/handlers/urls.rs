//! Handlers for short link endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::url::{CreateUrlRequest, UpdateUrlRequest, UrlResponse};
use crate::domain::entities::Claims;
use crate::error::AppError;
use crate::state::AppState;

/// Creates an anonymous short link.
///
/// # Endpoint
///
/// `POST /v1/url/create`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/some/page",
///   "code": "my-link",                     // optional
///   "expires_at": "2030-01-01T00:00:00Z"   // optional
/// }
/// ```
///
/// Anonymous links have no owner, so only an administrator may later change
/// or delete them.
///
/// # Errors
///
/// - 400 for an invalid URL, code or past expiry
/// - 409 if the requested code is taken
pub async fn create_url_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateUrlRequest>,
) -> Result<(StatusCode, Json<UrlResponse>), AppError> {
    create_url(&state, payload, None).await
}

/// Creates a short link owned by the authenticated caller.
///
/// # Endpoint
///
/// `POST /v1/user/url/create` (Bearer token required)
pub async fn create_user_url_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateUrlRequest>,
) -> Result<(StatusCode, Json<UrlResponse>), AppError> {
    create_url(&state, payload, Some(&claims)).await
}

async fn create_url(
    state: &AppState,
    payload: CreateUrlRequest,
    owner: Option<&Claims>,
) -> Result<(StatusCode, Json<UrlResponse>), AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .create_short_link(payload.url, payload.code, payload.expires_at, owner)
        .await?;

    let short_url = state.short_url(&link.code);
    Ok((
        StatusCode::CREATED,
        Json(UrlResponse::from_link(link, short_url)),
    ))
}

/// Returns the record of a live short link.
///
/// # Endpoint
///
/// `GET /v1/url/{code}`
///
/// # Errors
///
/// - 400 for a malformed code
/// - 404 if the link does not exist or has expired
pub async fn get_url_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<UrlResponse>, AppError> {
    let link = state.link_service.get_by_code(&code).await?;
    let short_url = state.short_url(&link.code);
    Ok(Json(UrlResponse::from_link(link, short_url)))
}

/// Changes the target and/or expiry of a link.
///
/// # Endpoint
///
/// `PUT /v1/url` (Bearer token required)
///
/// ```json
/// { "code": "abc123", "url": "https://new.example.com", "expires_at": null }
/// ```
///
/// # Errors
///
/// - 400 when nothing is changed or a field is invalid
/// - 403 unless the caller owns the link or is an administrator
/// - 404 if the link does not exist
pub async fn update_url_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateUrlRequest>,
) -> Result<Json<UrlResponse>, AppError> {
    payload.validate()?;

    let (code, patch) = payload.into_parts();
    let link = state.link_service.update_link(&code, patch, &claims).await?;

    let short_url = state.short_url(&link.code);
    Ok(Json(UrlResponse::from_link(link, short_url)))
}

/// Deletes a link.
///
/// # Endpoint
///
/// `DELETE /v1/url/{code}` (Bearer token required)
///
/// Returns `204 No Content` on success; 403 and 404 as for updates.
pub async fn delete_url_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete_link(&code, &claims).await?;
    Ok(StatusCode::NO_CONTENT)
}
