//! Time source abstraction for token expiry decisions.
//!
//! Every expiry check in the crate (token parsing, revocation lookups,
//! sweeping) reads the clock through [`TimeSource`], so production code
//! uses the system clock while tests advance a manual clock explicitly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over wall-clock time.
///
/// Implementations must be shareable across request workers.
pub trait TimeSource: Send + Sync + std::fmt::Debug {
    /// Get the current time in whole seconds since the Unix epoch.
    fn now_secs(&self) -> u64;
}

/// Real time source using the system clock.
///
/// This is the default implementation used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_secs(&self) -> u64 {
        // Clocks set before 1970 read as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_secs())
    }
}

/// A manually driven time source.
///
/// Time only moves when [`advance`](Self::advance) or [`set`](Self::set) is
/// called. Backed by an atomic so one instance can be shared between the
/// codec, the revocation store and test code running on several workers.
///
/// # Example
///
/// ```
/// use gatekeeper::time::{ManualTimeSource, TimeSource};
///
/// let time = ManualTimeSource::new(1_000);
/// assert_eq!(time.now_secs(), 1_000);
///
/// time.advance(60);
/// assert_eq!(time.now_secs(), 1_060);
/// ```
#[derive(Debug)]
pub struct ManualTimeSource {
    current_secs: AtomicU64,
}

impl ManualTimeSource {
    /// Create a manual time source starting at `initial_secs`.
    #[must_use]
    pub const fn new(initial_secs: u64) -> Self {
        Self {
            current_secs: AtomicU64::new(initial_secs),
        }
    }

    /// Create a manual time source starting at `1_700_000_000` (November 2023).
    #[must_use]
    pub const fn default_start() -> Self {
        Self::new(1_700_000_000)
    }

    /// Advance time by `secs`, saturating at `u64::MAX`.
    pub fn advance(&self, secs: u64) {
        // fetch_update with a total function never returns Err.
        let _ = self
            .current_secs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(secs))
            });
    }

    /// Set the current time. May move time backwards.
    pub fn set(&self, secs: u64) {
        self.current_secs.store(secs, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_secs(&self) -> u64 {
        self.current_secs.load(Ordering::SeqCst)
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::default_start()
    }
}
