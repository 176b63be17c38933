//! Registration and login round trips.

use reqwest::StatusCode;

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_register_returns_account_profile_and_token() {
    let server = TestServer::start().await;

    let response = server.register("ada@example.com", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body(response).await;
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["firstname"], "Ada");
    assert_eq!(body["user"]["lastname"], "Lovelace");
    assert_eq!(body["profile"]["roles"], "Personal Profile");
    assert_eq!(body["profile"]["id"], body["user"]["id"]);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["expires_at"].as_u64().is_some());

    let rendered = body.to_string();
    assert!(!rendered.contains("argon2"), "digest leaked: {rendered}");
    assert!(!rendered.contains(PASSWORD), "password leaked: {rendered}");
}

#[tokio::test]
async fn test_token_from_login_opens_protected_route() {
    let server = TestServer::start().await;
    let registered = body(server.register("ada@example.com", PASSWORD).await).await;

    let response = server.login("ada@example.com", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let logged_in = body(response).await;
    assert_eq!(logged_in["user"]["id"], registered["user"]["id"]);
    assert_ne!(logged_in["token"], registered["token"]);

    let token = logged_in["token"].as_str().expect("token");
    let me = server.me(Some(&format!("Bearer {token}"))).await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(body(me).await["id"], registered["user"]["id"]);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let server = TestServer::start().await;
    server.register_token("ada@example.com").await;

    let error = expect_error(
        server.register("ada@example.com", "another-password").await,
        StatusCode::CONFLICT,
    )
    .await;
    assert_eq!(error, "an account with this email already exists");
    assert_eq!(server.credentials.account_count(), Ok(1));
}

#[tokio::test]
async fn test_invalid_registration_is_bad_request() {
    let server = TestServer::start().await;

    expect_error(
        server.register("not-an-email", PASSWORD).await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    expect_error(
        server.register("ada@example.com", "12345").await,
        StatusCode::BAD_REQUEST,
    )
    .await;

    assert_eq!(server.credentials.account_count(), Ok(0));
}
