use std::net::SocketAddr;
use std::sync::Arc;

use gatekeeper::auth::{SweeperConfig, spawn_revocation_sweeper};
use gatekeeper::config::ServerConfig;
use gatekeeper::credentials::InMemoryCredentialStore;
use gatekeeper::time::{SystemTimeSource, TimeSource};
use gatekeeper::{AppState, router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatekeeper=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: listen_port={}, token_lifetime={:?}, sweep_interval={:?}",
        config.listen_port,
        config.token_lifetime,
        config.sweep_interval
    );

    let clock: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
    let credentials = Arc::new(InMemoryCredentialStore::new());
    let state = match AppState::from_config(&config, clock, credentials) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize password hasher: {e}");
            std::process::exit(1);
        }
    };

    // The sweeper holds a weak reference and stops once the state is dropped.
    let _sweeper = spawn_revocation_sweeper(
        Arc::downgrade(&state.revocations),
        SweeperConfig {
            interval: config.sweep_interval,
        },
    );

    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.listen_port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}
