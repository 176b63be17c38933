//! HTTP routes.
//!
//! | Method | Path           | Auth            |
//! |--------|----------------|-----------------|
//! | POST   | `/register`    | none            |
//! | POST   | `/login`       | none            |
//! | POST   | `/user/logout` | bearer (own check, expired tokens accepted) |
//! | GET    | `/user/me`     | bearer via [`require_principal`] |
//!
//! Every error body is `{"error": "<message>"}`.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use serde::{Deserialize, Serialize};

use crate::auth::{
    AuthGate, CredentialHasher, HashError, InMemoryRevocationStore, LogoutOutcome, Principal,
    Registration, RevocationStore, Session, SessionError, SessionManager, TokenCodec, bearer_token,
    require_principal,
};
use crate::config::ServerConfig;
use crate::credentials::{CredentialStore, Profile, ProfileDefaults};
use crate::time::TimeSource;

/// Shared state handed to every handler.
pub struct AppState<S> {
    pub sessions: Arc<SessionManager<S>>,
    pub gate: AuthGate,
    /// Also held by the gate and the session manager; exposed for the sweeper.
    pub revocations: Arc<dyn RevocationStore>,
}

impl<S: CredentialStore> AppState<S> {
    /// Wire the auth core together from `config`, with an in-memory revocation list.
    ///
    /// # Errors
    ///
    /// Returns `HashError::InvalidCost` if the configured hash cost is rejected.
    pub fn from_config(
        config: &ServerConfig,
        clock: Arc<dyn TimeSource>,
        credentials: Arc<S>,
    ) -> Result<Self, HashError> {
        let hasher = CredentialHasher::new(config.hash_cost)?;
        let codec = Arc::new(TokenCodec::new(
            &config.signing_secret,
            config.token_lifetime,
            Arc::clone(&clock),
        ));
        let revocations: Arc<dyn RevocationStore> =
            Arc::new(InMemoryRevocationStore::new(clock));

        let gate = AuthGate::new(Arc::clone(&codec), Arc::clone(&revocations));
        let sessions = Arc::new(SessionManager::new(
            hasher,
            codec,
            Arc::clone(&revocations),
            credentials,
        ));

        Ok(Self {
            sessions,
            gate,
            revocations,
        })
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            gate: self.gate.clone(),
            revocations: Arc::clone(&self.revocations),
        }
    }
}

/// Build the application router.
pub fn router<S: CredentialStore + 'static>(state: AppState<S>) -> Router {
    let protected: Router<AppState<S>> = Router::new()
        .route("/user/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            state.gate.clone(),
            require_principal,
        ));

    Router::new()
        .route("/register", post(register::<S>))
        .route("/login", post(login::<S>))
        .route("/user/logout", post(logout::<S>))
        .merge(protected)
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default, rename = "firstname")]
    pub first_name: Option<String>,
    #[serde(default, rename = "lastname")]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of an account. Never carries the password digest.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Principal,
    pub email: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserView,
    pub profile: Profile,
    pub token: String,
    pub expires_at: u64,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            user: UserView {
                id: session.account.principal,
                email: session.account.email,
                firstname: session.account.first_name,
                lastname: session.account.last_name,
            },
            profile: session.profile,
            token: session.token.token,
            expires_at: session.token.claims.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PrincipalResponse {
    pub id: Principal,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

async fn register<S: CredentialStore + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, SessionError> {
    let request = request_body(body)?;
    let registration = Registration {
        email: request.email,
        password: request.password,
        first_name: request.first_name,
        last_name: request.last_name,
    };
    let session = state
        .sessions
        .register(registration, ProfileDefaults::default())
        .await?;
    Ok(Json(session.into()))
}

async fn login<S: CredentialStore + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, SessionError> {
    let request = request_body(body)?;
    let session = state
        .sessions
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(session.into()))
}

async fn logout<S: CredentialStore + 'static>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, SessionError> {
    let token = bearer_token(&headers).ok_or_else(|| {
        SessionError::Validation("authorization header is missing or malformed".to_string())
    })?;

    let message = match state.sessions.logout(token)? {
        LogoutOutcome::Revoked => "Logged out successfully",
        LogoutOutcome::AlreadyExpired => "Session already expired",
    };
    Ok(Json(MessageResponse { message }))
}

/// Unwrap a JSON body, reporting an unreadable one as a validation error.
fn request_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, SessionError> {
    body.map(|Json(request)| request)
        .map_err(|rejection| SessionError::Validation(rejection.body_text()))
}

async fn me(Extension(principal): Extension<Principal>) -> Json<PrincipalResponse> {
    Json(PrincipalResponse { id: principal })
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let error = match self {
            Self::Infrastructure(detail) => {
                tracing::error!("request failed: {detail}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}
