//! Background eviction of expired revocation entries.
//!
//! Eviction is never needed for correctness (lookups ignore expired
//! entries); it only bounds memory. The task runs on its own timer and each
//! pass holds the store's lock only for the duration of `purge_expired`.
//!
//! # Design
//!
//! The task holds a `Weak<dyn RevocationStore>`:
//! - The application state owns the store.
//! - When the last strong reference is dropped, `Weak::upgrade()` returns
//!   `None` and the task exits.

use std::sync::Weak;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use super::RevocationStore;

/// Configuration for the revocation sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweeperConfig {
    /// Time between passes.
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
        }
    }
}

/// Spawn a background task that periodically purges expired revocations.
///
/// # Arguments
/// * `store` - Weak reference to the store to sweep
/// * `config` - Sweeper configuration
///
/// # Returns
/// A `JoinHandle` that can be awaited or aborted on shutdown.
///
/// # Invariants
/// - The first pass runs one full `interval` after spawning.
/// - Exits cleanly when the store is dropped.
pub fn spawn_revocation_sweeper(
    store: Weak<dyn RevocationStore>,
    config: SweeperConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        sweep_loop(store, config).await;
    })
}

async fn sweep_loop(store: Weak<dyn RevocationStore>, config: SweeperConfig) {
    let mut ticker = tokio::time::interval_at(
        tokio::time::Instant::now() + config.interval,
        config.interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(store) = store.upgrade() else {
            tracing::debug!("revocation store dropped, sweeper exiting");
            break;
        };

        match store.purge_expired() {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "purged expired revocations"),
            // Errors are logged and retried on the next tick.
            Err(e) => tracing::warn!("revocation sweep failed: {e}"),
        }
    }
}
