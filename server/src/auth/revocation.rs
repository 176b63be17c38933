//! Revocation list for tokens invalidated before their natural expiry.
//!
//! Entries map a token id (`jti`) to the token's own expiry. Once that expiry
//! passes, the codec already rejects the token, so an entry is dead weight
//! and may be evicted at any time.
//!
//! # Post-conditions
//! - A `revoke` that has returned is visible to every later `is_revoked`,
//!   from any thread.
//!
//! # Invariants
//! - No entry is kept past its `expires_at`: expired entries are never
//!   inserted, are evicted on read, and are removed by `purge_expired`.
//! - Critical sections are O(1) (O(n) for `purge_expired`) and never await.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::time::TimeSource;

/// Errors that can occur when accessing a revocation store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevocationError {
    /// The in-process lock was poisoned by a panicking writer.
    LockPoisoned,
    /// An external backing store could not be reached.
    Unavailable(String),
}

impl std::fmt::Display for RevocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LockPoisoned => write!(f, "revocation store lock poisoned"),
            Self::Unavailable(reason) => write!(f, "revocation store unavailable: {reason}"),
        }
    }
}

impl std::error::Error for RevocationError {}

/// Storage backend for the revocation list.
///
/// The gate and the session manager only see this trait, so a shared cache
/// can replace the in-memory map for multi-process deployments.
pub trait RevocationStore: Send + Sync {
    /// Record `token_id` as revoked until `expires_at` (seconds since the epoch).
    ///
    /// Idempotent: revoking an already-revoked id succeeds and changes nothing.
    fn revoke(&self, token_id: &str, expires_at: u64) -> Result<(), RevocationError>;

    /// Returns `true` iff `token_id` has an entry whose expiry is still in the future.
    fn is_revoked(&self, token_id: &str) -> Result<bool, RevocationError>;

    /// Remove every entry whose expiry has passed, returning how many were removed.
    fn purge_expired(&self) -> Result<usize, RevocationError>;
}

/// Single-process revocation store backed by a `RwLock<HashMap>`.
///
/// # Thread Safety
///
/// Readers share the lock; `revoke`, eviction and purging take it exclusively.
#[derive(Debug)]
pub struct InMemoryRevocationStore {
    /// Token id to the token's expiry.
    entries: RwLock<HashMap<String, u64>>,
    clock: Arc<dyn TimeSource>,
}

impl InMemoryRevocationStore {
    #[must_use]
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of entries currently held, including expired ones not yet evicted.
    pub fn len(&self) -> Result<usize, RevocationError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| RevocationError::LockPoisoned)?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, RevocationError> {
        Ok(self.len()? == 0)
    }

    /// Drop `token_id` if its entry has expired by `now`.
    fn evict_if_expired(&self, token_id: &str, now: u64) -> Result<(), RevocationError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| RevocationError::LockPoisoned)?;
        // Re-check under the write lock: a concurrent revoke may have replaced the entry.
        if entries.get(token_id).is_some_and(|&expires_at| expires_at <= now) {
            entries.remove(token_id);
        }
        Ok(())
    }
}

impl RevocationStore for InMemoryRevocationStore {
    fn revoke(&self, token_id: &str, expires_at: u64) -> Result<(), RevocationError> {
        if expires_at <= self.clock.now_secs() {
            return Ok(());
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|_| RevocationError::LockPoisoned)?;
        entries.entry(token_id.to_string()).or_insert(expires_at);
        Ok(())
    }

    fn is_revoked(&self, token_id: &str) -> Result<bool, RevocationError> {
        let now = self.clock.now_secs();
        let expires_at = {
            let entries = self
                .entries
                .read()
                .map_err(|_| RevocationError::LockPoisoned)?;
            entries.get(token_id).copied()
        };

        match expires_at {
            Some(expires_at) if now < expires_at => Ok(true),
            Some(_) => {
                self.evict_if_expired(token_id, now)?;
                Ok(false)
            }
            None => Ok(false),
        }
    }

    fn purge_expired(&self) -> Result<usize, RevocationError> {
        let now = self.clock.now_secs();
        let mut entries = self
            .entries
            .write()
            .map_err(|_| RevocationError::LockPoisoned)?;
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at > now);
        Ok(before - entries.len())
    }
}
