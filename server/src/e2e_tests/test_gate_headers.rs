//! Malformed or missing `Authorization` headers never reach a handler.

use reqwest::StatusCode;

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_missing_header() {
    let server = TestServer::start().await;
    let error = expect_error(server.me(None).await, StatusCode::UNAUTHORIZED).await;
    assert_eq!(error, "authorization header is missing or malformed");
}

#[tokio::test]
async fn test_malformed_headers() {
    let server = TestServer::start().await;
    let token = server.register_token("ada@example.com").await;

    for header in [
        "Bearer".to_string(),
        "Bearer ".to_string(),
        format!("bearer {token}"),
        format!("Basic {token}"),
        token.clone(),
    ] {
        let error = expect_error(server.me(Some(&header)).await, StatusCode::UNAUTHORIZED).await;
        assert_eq!(
            error, "authorization header is missing or malformed",
            "header {header:?}"
        );
    }
}

#[tokio::test]
async fn test_tampered_token() {
    let server = TestServer::start().await;
    let token = server.register_token("ada@example.com").await;

    let (rest, signature) = token.rsplit_once('.').expect("three segments");
    let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{rest}.{flipped}{}", &signature[1..]);

    let error = expect_error(
        server.me(Some(&format!("Bearer {tampered}"))).await,
        StatusCode::UNAUTHORIZED,
    )
    .await;
    assert!(error.starts_with("invalid token"), "{error}");
}
