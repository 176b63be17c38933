//! Revocation is visible to requests served by any worker thread.

use futures::future::join_all;
use reqwest::StatusCode;

use crate::e2e_tests::helpers::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_revocation_visible_across_workers() {
    let server = TestServer::start().await;

    let mut tokens = Vec::new();
    for i in 0..8 {
        tokens.push(server.register_token(&format!("user{i}@example.com")).await);
    }

    let logouts = join_all(tokens.iter().map(|token| server.logout(token))).await;
    assert!(logouts.iter().all(|r| r.status() == StatusCode::OK));

    let headers: Vec<String> = tokens
        .iter()
        .flat_map(|token| std::iter::repeat_n(format!("Bearer {token}"), 4))
        .collect();
    let checks = join_all(headers.iter().map(|header| server.me(Some(header)))).await;

    for response in checks {
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_logouts_of_same_token() {
    let server = TestServer::start().await;
    let token = server.register_token("ada@example.com").await;

    let responses = join_all((0..16).map(|_| server.logout(&token))).await;
    assert!(responses.iter().all(|r| r.status() == StatusCode::OK));

    let error = expect_error(
        server.me(Some(&format!("Bearer {token}"))).await,
        StatusCode::UNAUTHORIZED,
    )
    .await;
    assert_eq!(error, "token has been revoked");
}
