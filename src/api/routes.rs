//! API route configuration.
//!
//! Public routes need no credentials. Protected routes go through
//! [`crate::api::middleware::auth`], which verifies the bearer token and
//! hands its claims to the handler.

use crate::api::handlers::{
    create_url_handler, create_user_handler, create_user_url_handler, delete_url_handler,
    delete_user_handler, get_url_handler, get_user_handler, token_handler, update_url_handler,
    update_user_handler,
};
use crate::api::middleware::auth;
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

/// Routes open to anonymous callers.
///
/// # Endpoints
///
/// - `POST /v1/url/create`   - Create an anonymous short link
/// - `GET  /v1/url/{code}`   - Fetch a link record
/// - `POST /v1/user/create`  - Register an account
/// - `GET  /v1/user/{id}`    - Fetch an account
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/url/create", post(create_url_handler))
        .route("/v1/url/{code}", get(get_url_handler))
        .route("/v1/user/create", post(create_user_handler))
        .route("/v1/user/{id}", get(get_user_handler))
}

/// Login route. Kept apart so it can carry a stricter rate limit.
///
/// - `GET /v1/user/token` - Exchange Basic credentials for a bearer token
pub fn credential_routes() -> Router<AppState> {
    Router::new().route("/v1/user/token", get(token_handler))
}

/// Routes that require a valid bearer token.
///
/// # Endpoints
///
/// - `POST   /v1/user/url/create` - Create a link owned by the caller
/// - `PUT    /v1/url`             - Update a link (owner or admin)
/// - `DELETE /v1/url/{code}`      - Delete a link (owner or admin)
/// - `PUT    /v1/user`            - Update an account (owner or admin)
/// - `DELETE /v1/user/{id}`       - Delete an account (owner or admin)
pub fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/user/url/create", post(create_user_url_handler))
        .route("/v1/url", put(update_url_handler))
        .route("/v1/url/{code}", delete(delete_url_handler))
        .route("/v1/user", put(update_user_handler))
        .route("/v1/user/{id}", delete(delete_user_handler))
        .route_layer(middleware::from_fn_with_state(state, auth::layer))
}

/// All `/v1` routes without rate limiting or tracing.
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(public_routes())
        .merge(credential_routes())
        .merge(protected_routes(state))
}
