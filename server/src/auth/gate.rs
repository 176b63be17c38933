//! Per-request bearer authentication.
//!
//! The gate is a plain function of the request headers:
//!
//! 1. extract `Authorization: Bearer <token>`
//! 2. verify the token ([`TokenCodec::parse`])
//! 3. reject if its `jti` is revoked
//! 4. parse `sub` into a [`Principal`]
//!
//! Any failure is terminal for the request. [`require_principal`] wraps
//! the check as axum middleware and stores the principal in the request
//! extensions for downstream handlers (`Extension<Principal>`).

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::{Principal, RevocationStore, TokenCodec, TokenError};
use crate::api::ErrorBody;

/// Scheme prefix of the `Authorization` header, including the separating space.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Extract the bearer credential from `headers`.
///
/// Returns `None` for a missing header, a non-UTF-8 value, any scheme
/// other than `Bearer`, or an empty credential.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_PREFIX)?;
    (!token.is_empty()).then_some(token)
}

/// Reason a request was refused by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No `Authorization` header, or not of the form `Bearer <token>`.
    MissingOrMalformedHeader,
    /// The token failed verification.
    InvalidToken(TokenError),
    /// The token was revoked before its expiry.
    Revoked,
    /// The token's subject is not a valid principal id.
    BadSubject,
    /// The revocation store could not be consulted.
    StoreUnavailable,
}

impl Rejection {
    /// Short machine-readable reason.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::MissingOrMalformedHeader => "missing_or_malformed_header",
            Self::InvalidToken(_) => "invalid_token",
            Self::Revoked => "revoked",
            Self::BadSubject => "bad_subject",
            Self::StoreUnavailable => "store_unavailable",
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::StoreUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingOrMalformedHeader => {
                write!(f, "authorization header is missing or malformed")
            }
            Self::InvalidToken(e) => write!(f, "invalid token: {e}"),
            Self::Revoked => write!(f, "token has been revoked"),
            Self::BadSubject => write!(f, "invalid user ID format in token claims"),
            Self::StoreUnavailable => write!(f, "authentication is temporarily unavailable"),
        }
    }
}

impl std::error::Error for Rejection {}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Request gate combining the token codec and the revocation store.
#[derive(Clone)]
pub struct AuthGate {
    codec: Arc<TokenCodec>,
    revocations: Arc<dyn RevocationStore>,
}

impl AuthGate {
    #[must_use]
    pub fn new(codec: Arc<TokenCodec>, revocations: Arc<dyn RevocationStore>) -> Self {
        Self { codec, revocations }
    }

    /// Decide whether a request bearing `headers` is authenticated.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, Rejection> {
        let token = bearer_token(headers).ok_or(Rejection::MissingOrMalformedHeader)?;
        self.authenticate_token(token)
    }

    /// Run steps 2-4 of the gate on an already extracted bearer credential.
    pub fn authenticate_token(&self, token: &str) -> Result<Principal, Rejection> {
        let claims = self.codec.parse(token).map_err(Rejection::InvalidToken)?;

        match self.revocations.is_revoked(&claims.token_id) {
            Ok(false) => {}
            Ok(true) => return Err(Rejection::Revoked),
            Err(e) => {
                tracing::error!("revocation check failed: {e}");
                return Err(Rejection::StoreUnavailable);
            }
        }

        claims.principal().map_err(|_| Rejection::BadSubject)
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

/// Axum middleware enforcing [`AuthGate::authenticate`].
///
/// On success the [`Principal`] is inserted into the request extensions;
/// on failure the request is answered immediately with the rejection.
pub async fn require_principal(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    match gate.authenticate(request.headers()) {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(rejection) => {
            tracing::debug!(reason = rejection.reason(), "rejected request: {rejection}");
            rejection.into_response()
        }
    }
}
