//! Common helpers for end-to-end tests.

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::credentials::InMemoryCredentialStore;
use crate::router;
use crate::testing::Fixture;
use crate::time::ManualTimeSource;

pub const PASSWORD: &str = "correct-horse";

/// A server listening on an ephemeral port; aborted on drop.
pub struct TestServer {
    pub clock: Arc<ManualTimeSource>,
    pub credentials: Arc<InMemoryCredentialStore>,
    pub client: reqwest::Client,
    addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let fixture = Fixture::new();
        let app = router(fixture.state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("listener has an address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server error");
        });

        Self {
            clock: fixture.clock,
            credentials: fixture.credentials,
            client: reqwest::Client::new(),
            addr,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn register(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/register"))
            .json(&json!({
                "email": email,
                "password": password,
                "firstname": "Ada",
                "lastname": "Lovelace",
            }))
            .send()
            .await
            .expect("register request")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request")
    }

    pub async fn logout(&self, token: &str) -> reqwest::Response {
        self.client
            .post(self.url("/user/logout"))
            .bearer_auth(token)
            .send()
            .await
            .expect("logout request")
    }

    /// `GET /user/me` with a raw `Authorization` header value, or none.
    pub async fn me(&self, authorization: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.url("/user/me"));
        if let Some(value) = authorization {
            request = request.header(reqwest::header::AUTHORIZATION, value);
        }
        request.send().await.expect("me request")
    }

    /// Register `email` and return the issued token.
    pub async fn register_token(&self, email: &str) -> String {
        let response = self.register(email, PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK);
        token_of(response).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn body(response: reqwest::Response) -> Value {
    response.json().await.expect("json body")
}

pub async fn token_of(response: reqwest::Response) -> String {
    body(response).await["token"]
        .as_str()
        .expect("token field")
        .to_string()
}

/// Assert `response` has `status` and return its `error` message.
pub async fn expect_error(response: reqwest::Response, status: StatusCode) -> String {
    assert_eq!(response.status(), status);
    body(response).await["error"]
        .as_str()
        .expect("error field")
        .to_string()
}
