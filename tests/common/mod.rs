#![allow(dead_code)]

use axum::Router;
use axum_test::TestServer;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use shortener::api::routes::api_routes;
use shortener::application::services::{Authenticator, LinkService, UserService};
use shortener::domain::entities::{Claims, Role, User};
use shortener::domain::repositories::{LinkRepository, UserRepository};
use shortener::infrastructure::keys::{StaticKeyLookup, generate_ed25519_keypair};
use shortener::infrastructure::persistence::{MemoryLinkRepository, MemoryUserRepository};
use shortener::state::AppState;
use shortener::utils::password::MIN_COST;

pub const BASE_URL: &str = "http://sho.rt";
pub const PASSWORD: &str = "correct-horse";
pub const TOKEN_TTL: Duration = Duration::from_secs(3600);

/// State backed by the in-memory store and a freshly generated signing key.
pub fn create_test_state() -> AppState {
    let pair = generate_ed25519_keypair().unwrap();
    let lookup = StaticKeyLookup::new(pair.kid.clone(), pair.decoding_key().unwrap());
    let authenticator = Authenticator::new(
        pair.encoding_key().unwrap(),
        pair.kid.clone(),
        "EdDSA",
        Arc::new(lookup),
    )
    .unwrap();

    let links: Arc<dyn LinkRepository> = Arc::new(MemoryLinkRepository::new());
    let users: Arc<dyn UserRepository> = Arc::new(MemoryUserRepository::new());

    AppState::new(
        LinkService::new(links),
        UserService::new(users)
            .with_bcrypt_cost(MIN_COST)
            .with_token_ttl(TOKEN_TTL),
        Arc::new(authenticator),
        BASE_URL,
    )
}

/// Every `/v1` route plus redirect, without rate limiting (no peer address
/// in tests).
pub fn create_test_app(state: AppState) -> Router {
    Router::new()
        .route(
            "/{code}",
            axum::routing::get(shortener::api::handlers::redirect_handler),
        )
        .route(
            "/health",
            axum::routing::get(shortener::api::handlers::health_handler),
        )
        .merge(api_routes(state.clone()))
        .with_state(state)
}

pub fn create_test_server(state: AppState) -> TestServer {
    TestServer::new(create_test_app(state)).unwrap()
}

pub async fn create_user(state: &AppState, email: &str, admin: bool) -> User {
    let mut roles = BTreeSet::from([Role::User]);
    if admin {
        roles.insert(Role::Admin);
    }

    state
        .user_service
        .create_user(
            email.to_string(),
            "Test User".to_string(),
            PASSWORD.to_string(),
            roles,
        )
        .await
        .unwrap()
}

/// Signed bearer token for `user`, as the login endpoint would issue it.
pub fn token_for(state: &AppState, user: &User) -> String {
    let claims = Claims::new(
        user.id.to_string(),
        user.roles.iter().copied(),
        Utc::now(),
        TOKEN_TTL,
    );
    state.authenticator.issue_token(&claims).unwrap()
}

pub fn bearer(token: &str) -> axum::http::HeaderValue {
    axum::http::HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

pub fn basic(email: &str, password: &str) -> axum::http::HeaderValue {
    use base64::Engine as _;
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{email}:{password}"));
    axum::http::HeaderValue::from_str(&format!("Basic {encoded}")).unwrap()
}
