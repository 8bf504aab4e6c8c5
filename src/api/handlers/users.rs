//! Handlers for user account endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::collections::BTreeSet;
use validator::Validate;

use crate::api::dto::user::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::domain::entities::Claims;
use crate::domain::policy::ensure_authorized;
use crate::error::AppError;
use crate::state::AppState;

/// Registers a new account with the `user` role.
///
/// # Endpoint
///
/// `POST /v1/user/create`
///
/// ```json
/// { "email": "alice@example.com", "full_name": "Alice", "password": "s3cret-pass" }
/// ```
///
/// # Errors
///
/// 400 for invalid input or an email that is already registered.
pub async fn create_user_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    payload.validate()?;

    let user = state
        .user_service
        .create_user(
            payload.email,
            payload.full_name,
            payload.password,
            BTreeSet::new(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// `GET /v1/user/{id}`
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.user_service.get_by_id(&id).await?;
    Ok(Json(user.into()))
}

/// Updates email, full name and/or password of an account.
///
/// # Endpoint
///
/// `PUT /v1/user` (Bearer token required)
///
/// A password change needs `current_password` next to `new_password`.
///
/// # Errors
///
/// - 400 when nothing is changed, input is invalid or the email is taken
/// - 401 if `current_password` is wrong
/// - 403 unless the caller is the account owner or an administrator
pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload.validate()?;

    let (id, changes) = payload.into_parts();
    let user = state.user_service.update_user(&id, changes, &claims).await?;
    Ok(Json(user.into()))
}

/// Deletes an account.
///
/// # Endpoint
///
/// `DELETE /v1/user/{id}` (Bearer token required)
///
/// Only the account owner or an administrator may delete it.
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    ensure_authorized(&claims, &id, "user")?;
    state.user_service.delete_user(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
