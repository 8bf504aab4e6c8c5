//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`          - Short link redirect (public)
//! - `GET  /health`          - Health check: store and signing keys (public)
//! - `GET  /v1/user/token`   - Login (strict rate limit)
//! - `/v1/*`                 - REST API, see [`crate::api::routes`]
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket
//! - **Authentication** - Bearer token on mutating routes
//! - **Path normalization** - Trailing slash handling

use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{rate_limit, tracing};
use crate::api::routes::{credential_routes, protected_routes, public_routes};
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// Rate limiting keys on the peer address, so the router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let public = public_routes()
        .route("/{code}", get(redirect_handler))
        .layer(rate_limit::layer());

    let credentials = credential_routes().layer(rate_limit::secure_layer());

    let protected = protected_routes(state.clone()).layer(rate_limit::secure_layer());

    let router = Router::new()
        .route("/health", get(health_handler))
        .merge(public)
        .merge(credentials)
        .merge(protected)
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
