mod common;

use axum::http::{StatusCode, header};
use chrono::{Duration, Utc};
use shortener::domain::entities::NewLink;
use shortener::domain::repositories::LinkRepository;
use shortener::infrastructure::persistence::MemoryLinkRepository;
use std::sync::Arc;

#[tokio::test]
async fn test_redirect_is_permanent() {
    let state = common::create_test_state();
    let link = state
        .link_service
        .create_short_link(
            "https://example.com/landing".to_string(),
            Some("go".to_string()),
            None,
            None,
        )
        .await
        .unwrap();
    let server = common::create_test_server(state);

    let response = server.get(&format!("/{}", link.code)).await;

    response.assert_status(StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.header(header::LOCATION),
        "https://example.com/landing"
    );
}

#[tokio::test]
async fn test_redirect_unknown_code() {
    let state = common::create_test_state();
    let server = common::create_test_server(state);

    server
        .get("/unknown")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expired_link_is_not_found() {
    let links = Arc::new(MemoryLinkRepository::new());
    links
        .create(NewLink {
            code: "old".to_string(),
            long_url: "https://example.com/".to_string(),
            owner_id: None,
            expires_at: Utc::now() - Duration::minutes(1),
        })
        .await
        .unwrap();

    let base = common::create_test_state();
    let state = shortener::state::AppState {
        link_service: Arc::new(shortener::application::services::LinkService::new(
            links as Arc<dyn LinkRepository>,
        )),
        ..base
    };
    let server = common::create_test_server(state);

    server
        .get("/old")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get("/v1/url/old")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expired_code_can_be_created_again() {
    let links = Arc::new(MemoryLinkRepository::new());
    links
        .create(NewLink {
            code: "promo1".to_string(),
            long_url: "https://example.com/old".to_string(),
            owner_id: Some("someone".to_string()),
            expires_at: Utc::now() - Duration::minutes(1),
        })
        .await
        .unwrap();

    let base = common::create_test_state();
    let state = shortener::state::AppState {
        link_service: Arc::new(shortener::application::services::LinkService::new(
            links as Arc<dyn LinkRepository>,
        )),
        ..base
    };
    let server = common::create_test_server(state);

    server
        .post("/v1/url/create")
        .json(&serde_json::json!({ "url": "https://example.com/new", "code": "promo1" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server.get("/promo1").await;
    response.assert_status(StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.header(header::LOCATION), "https://example.com/new");
}
