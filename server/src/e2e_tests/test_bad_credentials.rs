//! Login failures must not reveal which credential was wrong.

use reqwest::StatusCode;

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_alike() {
    let server = TestServer::start().await;
    server.register_token("ada@example.com").await;

    let wrong_password = expect_error(
        server.login("ada@example.com", "wrong-password").await,
        StatusCode::UNAUTHORIZED,
    )
    .await;
    let unknown_email = expect_error(
        server.login("grace@example.com", PASSWORD).await,
        StatusCode::UNAUTHORIZED,
    )
    .await;

    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password, "invalid email or password");
}

#[tokio::test]
async fn test_missing_fields_are_bad_request() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(server.url("/login"))
        .json(&serde_json::json!({ "email": "ada@example.com" }))
        .send()
        .await
        .expect("login request");

    let error = expect_error(response, StatusCode::BAD_REQUEST).await;
    assert!(error.contains("password"), "{error}");
}

#[tokio::test]
async fn test_unparsable_body_is_bad_request() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(server.url("/register"))
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{\"email\": ")
        .send()
        .await
        .expect("register request");

    expect_error(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(server.credentials.account_count(), Ok(0));
}
