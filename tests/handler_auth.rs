mod common;

use axum::http::{StatusCode, header};
use chrono::Utc;
use serde_json::json;
use shortener::domain::entities::Role;

#[tokio::test]
async fn test_login_issues_verifiable_token() {
    let state = common::create_test_state();
    let admin = common::create_user(&state, "root@example.com", true).await;
    let server = common::create_test_server(state.clone());

    let response = server
        .get("/v1/user/token")
        .add_header(
            header::AUTHORIZATION,
            common::basic("root@example.com", common::PASSWORD),
        )
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["token_type"], "Bearer");
    assert_eq!(json["expires_in"], common::TOKEN_TTL.as_secs());

    let token = json["access_token"].as_str().unwrap();
    let header = jsonwebtoken::decode_header(token).unwrap();
    assert_eq!(header.kid.as_deref(), Some(state.authenticator.active_kid()));
    assert_eq!(header.alg, jsonwebtoken::Algorithm::EdDSA);

    let claims = state.authenticator.verify_token(token).await.unwrap();
    assert_eq!(claims.sub, admin.id.to_string());
    assert!(claims.has_role(Role::Admin));
    assert!(claims.has_role(Role::User));
    assert_eq!(claims.exp - claims.iat, common::TOKEN_TTL.as_secs() as i64);
    assert!(claims.iat <= Utc::now().timestamp());
}

#[tokio::test]
async fn test_login_token_authorizes_requests() {
    let state = common::create_test_state();
    common::create_user(&state, "alice@example.com", false).await;
    let server = common::create_test_server(state);

    let login = server
        .get("/v1/user/token")
        .add_header(
            header::AUTHORIZATION,
            common::basic("alice@example.com", common::PASSWORD),
        )
        .await;
    login.assert_status_ok();
    let token = login.json::<serde_json::Value>()["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    server
        .post("/v1/user/url/create")
        .add_header(header::AUTHORIZATION, common::bearer(&token))
        .json(&json!({ "url": "https://example.com" }))
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_login_failures_look_the_same() {
    let state = common::create_test_state();
    common::create_user(&state, "alice@example.com", false).await;
    let server = common::create_test_server(state);

    let wrong_password = server
        .get("/v1/user/token")
        .add_header(
            header::AUTHORIZATION,
            common::basic("alice@example.com", "not-the-password"),
        )
        .await;
    let unknown_email = server
        .get("/v1/user/token")
        .add_header(
            header::AUTHORIZATION,
            common::basic("nobody@example.com", common::PASSWORD),
        )
        .await;

    wrong_password.assert_status(StatusCode::UNAUTHORIZED);
    unknown_email.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        wrong_password.json::<serde_json::Value>(),
        unknown_email.json::<serde_json::Value>()
    );
}

#[tokio::test]
async fn test_login_without_credentials() {
    let state = common::create_test_state();
    let server = common::create_test_server(state);

    let response = server.get("/v1/user/token").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.header(header::WWW_AUTHENTICATE), "Bearer");
}
