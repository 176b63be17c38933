//! Logout revokes exactly the presented token.

use reqwest::StatusCode;

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_logout_revokes_token() {
    let server = TestServer::start().await;
    let token = server.register_token("ada@example.com").await;
    let header = format!("Bearer {token}");

    assert_eq!(server.me(Some(&header)).await.status(), StatusCode::OK);

    let response = server.logout(&token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["message"], "Logged out successfully");

    let error = expect_error(server.me(Some(&header)).await, StatusCode::UNAUTHORIZED).await;
    assert_eq!(error, "token has been revoked");
}

#[tokio::test]
async fn test_logout_leaves_other_sessions_valid() {
    let server = TestServer::start().await;
    let first = server.register_token("ada@example.com").await;
    let second = token_of(server.login("ada@example.com", PASSWORD).await).await;

    assert_eq!(server.logout(&first).await.status(), StatusCode::OK);

    assert_eq!(
        server.me(Some(&format!("Bearer {first}"))).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        server.me(Some(&format!("Bearer {second}"))).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_logout_twice_succeeds() {
    let server = TestServer::start().await;
    let token = server.register_token("ada@example.com").await;

    assert_eq!(server.logout(&token).await.status(), StatusCode::OK);
    assert_eq!(server.logout(&token).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_requires_bearer_header() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(server.url("/user/logout"))
        .send()
        .await
        .expect("logout request");
    expect_error(response, StatusCode::BAD_REQUEST).await;

    expect_error(server.logout("not.a.token").await, StatusCode::UNAUTHORIZED).await;
}
