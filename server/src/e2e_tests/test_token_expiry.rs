//! Expired tokens are refused by the gate as invalid, whether or not they were revoked.

use reqwest::StatusCode;

use crate::config::ServerConfig;
use crate::e2e_tests::helpers::*;

const LIFETIME_SECS: u64 = ServerConfig::DEFAULT_TOKEN_LIFETIME_SECS;

#[tokio::test]
async fn test_token_valid_until_expiry() {
    let server = TestServer::start().await;
    let token = server.register_token("ada@example.com").await;
    let header = format!("Bearer {token}");

    server.clock.advance(LIFETIME_SECS - 1);
    assert_eq!(server.me(Some(&header)).await.status(), StatusCode::OK);

    server.clock.advance(1);
    let error = expect_error(server.me(Some(&header)).await, StatusCode::UNAUTHORIZED).await;
    assert_eq!(error, "invalid token: token has expired");
}

#[tokio::test]
async fn test_revoked_token_after_expiry_reports_expired() {
    let server = TestServer::start().await;
    let token = server.register_token("ada@example.com").await;
    assert_eq!(server.logout(&token).await.status(), StatusCode::OK);

    server.clock.advance(LIFETIME_SECS);
    let error = expect_error(
        server.me(Some(&format!("Bearer {token}"))).await,
        StatusCode::UNAUTHORIZED,
    )
    .await;
    assert_eq!(error, "invalid token: token has expired");
}

#[tokio::test]
async fn test_logout_with_expired_token_is_noop() {
    let server = TestServer::start().await;
    let token = server.register_token("ada@example.com").await;

    server.clock.advance(LIFETIME_SECS + 60);
    let response = server.logout(&token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["message"], "Session already expired");
}
