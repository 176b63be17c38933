use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};

use crate::api::AppState;
use crate::auth::{
    AuthGate, CredentialHasher, HashCost, RevocationStore, SigningSecret, TokenCodec,
};
use crate::config::ServerConfig;
use crate::credentials::InMemoryCredentialStore;
use crate::time::ManualTimeSource;

/// Signing secret shared by every fixture.
pub const TEST_SECRET: &[u8] = b"gatekeeper-test-secret-0123456789abcdef";

/// Argon2 at its minimum cost, so tests do not spend seconds hashing.
pub const fn cheap_hash_cost() -> HashCost {
    HashCost {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        signing_secret: SigningSecret::new(TEST_SECRET.to_vec())
            .expect("test secret is long enough"),
        listen_port: 0,
        token_lifetime: Duration::from_secs(ServerConfig::DEFAULT_TOKEN_LIFETIME_SECS),
        hash_cost: cheap_hash_cost(),
        sweep_interval: Duration::from_secs(ServerConfig::DEFAULT_SWEEP_INTERVAL_SECS),
    }
}

/// Fully wired auth core on a manual clock.
///
/// `codec` uses the same secret and clock as the one inside `state`, so
/// tokens it issues are accepted by `gate`.
pub struct Fixture {
    pub clock: Arc<ManualTimeSource>,
    pub config: ServerConfig,
    pub credentials: Arc<InMemoryCredentialStore>,
    pub state: AppState<InMemoryCredentialStore>,
    pub codec: Arc<TokenCodec>,
    pub gate: AuthGate,
    pub revocations: Arc<dyn RevocationStore>,
}

impl Fixture {
    pub fn new() -> Self {
        let clock = Arc::new(ManualTimeSource::default_start());
        let config = test_config();
        let credentials = Arc::new(InMemoryCredentialStore::new());
        let state = AppState::from_config(&config, clock.clone(), credentials.clone())
            .expect("cheap hash cost is valid");
        let codec = Arc::new(TokenCodec::new(
            &config.signing_secret,
            config.token_lifetime,
            clock.clone(),
        ));

        Self {
            gate: state.gate.clone(),
            revocations: state.revocations.clone(),
            clock,
            config,
            credentials,
            state,
            codec,
        }
    }

    /// A hasher with the fixture's cost, for seeding digests directly.
    pub fn hasher(&self) -> CredentialHasher {
        CredentialHasher::new(self.config.hash_cost).expect("cheap hash cost is valid")
    }
}

/// Headers carrying `Authorization: Bearer <token>`.
pub fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("token is ascii"),
    );
    headers
}
