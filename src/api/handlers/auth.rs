//! Handler for the token endpoint.

use axum::{Json, extract::State, http::StatusCode};
use axum_auth::AuthBasic;
use chrono::Utc;
use serde_json::json;

use crate::api::dto::auth::TokenResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Exchanges HTTP Basic credentials for a signed bearer token.
///
/// # Endpoint
///
/// `GET /v1/user/token` with `Authorization: Basic base64(email:password)`
///
/// # Response
///
/// ```json
/// { "access_token": "eyJ...", "token_type": "Bearer", "expires_in": 3600 }
/// ```
///
/// The token header names the active signing key in `kid`; its claims carry
/// the user id as `sub` and the account roles.
///
/// # Errors
///
/// 401 for missing credentials, an unknown email or a wrong password. The
/// response does not tell which one it was.
pub async fn token_handler(
    State(state): State<AppState>,
    credentials: Result<AuthBasic, (StatusCode, &'static str)>,
) -> Result<Json<TokenResponse>, AppError> {
    let AuthBasic((email, password)) = credentials.map_err(|_| missing_credentials())?;
    let password = password.ok_or_else(missing_credentials)?;

    let claims = state
        .user_service
        .authenticate(Utc::now(), &email, &password)
        .await?;
    let token = state.authenticator.issue_token(&claims)?;

    Ok(Json(TokenResponse::bearer(
        token,
        state.user_service.token_ttl().as_secs(),
    )))
}

fn missing_credentials() -> AppError {
    AppError::unauthorized(
        "Unauthorized",
        json!({ "reason": "Basic credentials are missing or invalid" }),
    )
}
