//! Server configuration module.
//!
//! Configuration is loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `GATEKEEPER_JWT_SECRET`: HMAC signing secret, at least 32 bytes (required)
//! - `GATEKEEPER_LISTEN_PORT`: Port to listen on (default: `3000`)
//! - `GATEKEEPER_TOKEN_LIFETIME_SECS`: Token lifetime (default: `86400`)
//! - `GATEKEEPER_HASH_MEMORY_KIB`: Argon2 memory cost (default: `19456`)
//! - `GATEKEEPER_HASH_ITERATIONS`: Argon2 time cost (default: `2`)
//! - `GATEKEEPER_HASH_PARALLELISM`: Argon2 lanes (default: `1`)
//! - `GATEKEEPER_SWEEP_INTERVAL_SECS`: Revocation sweep period (default: `300`)
//!
//! # Invariants
//!
//! - `signing_secret` is at least [`MIN_SECRET_LEN`](crate::auth::MIN_SECRET_LEN) bytes
//! - `token_lifetime` and `sweep_interval` are non-zero

use std::str::FromStr;
use std::time::Duration;

use crate::auth::{HashCost, SigningSecret};

const JWT_SECRET: &str = "GATEKEEPER_JWT_SECRET";
const LISTEN_PORT: &str = "GATEKEEPER_LISTEN_PORT";
const TOKEN_LIFETIME_SECS: &str = "GATEKEEPER_TOKEN_LIFETIME_SECS";
const HASH_MEMORY_KIB: &str = "GATEKEEPER_HASH_MEMORY_KIB";
const HASH_ITERATIONS: &str = "GATEKEEPER_HASH_ITERATIONS";
const HASH_PARALLELISM: &str = "GATEKEEPER_HASH_PARALLELISM";
const SWEEP_INTERVAL_SECS: &str = "GATEKEEPER_SWEEP_INTERVAL_SECS";

/// Server configuration.
///
/// # Pre-conditions
///
/// When constructed via `from_env()`:
/// - `GATEKEEPER_JWT_SECRET` must be set
/// - All values that are set must parse for their respective types
///
/// # Post-conditions
///
/// - Every field holds either a validated value or its default
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Secret used to sign and verify session tokens.
    pub signing_secret: SigningSecret,
    /// Port to listen on for HTTP connections.
    pub listen_port: u16,
    /// Validity period of issued tokens.
    pub token_lifetime: Duration,
    /// Argon2id work factor for new password digests.
    pub hash_cost: HashCost,
    /// Time between revocation sweeps.
    pub sweep_interval: Duration,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    /// Default port for the server.
    pub const DEFAULT_PORT: u16 = 3000;
    /// Default token lifetime: one day.
    pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 24 * 60 * 60;
    /// Default revocation sweep period.
    pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `GATEKEEPER_JWT_SECRET` is not set or shorter than 32 bytes
    /// - any other variable is set but does not parse, or is zero where a
    ///   positive value is needed
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let signing_secret = load_signing_secret(&lookup)?;
        let listen_port = parse_or(&lookup, LISTEN_PORT, Self::DEFAULT_PORT)?;
        let token_lifetime = positive_secs(
            &lookup,
            TOKEN_LIFETIME_SECS,
            Self::DEFAULT_TOKEN_LIFETIME_SECS,
        )?;
        let sweep_interval = positive_secs(
            &lookup,
            SWEEP_INTERVAL_SECS,
            Self::DEFAULT_SWEEP_INTERVAL_SECS,
        )?;

        let defaults = HashCost::default();
        let hash_cost = HashCost {
            memory_kib: parse_or(&lookup, HASH_MEMORY_KIB, defaults.memory_kib)?,
            iterations: parse_or(&lookup, HASH_ITERATIONS, defaults.iterations)?,
            parallelism: parse_or(&lookup, HASH_PARALLELISM, defaults.parallelism)?,
        };

        Ok(Self {
            signing_secret,
            listen_port,
            token_lifetime,
            hash_cost,
            sweep_interval,
        })
    }
}

fn load_signing_secret(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<SigningSecret, ConfigError> {
    let secret =
        lookup(JWT_SECRET).ok_or_else(|| ConfigError::MissingEnvVar(JWT_SECRET.to_string()))?;

    SigningSecret::new(secret.into_bytes()).map_err(|e| ConfigError::InvalidValue {
        name: JWT_SECRET.to_string(),
        message: e.to_string(),
    })
}

/// Parse `name` if set, otherwise return `default`.
fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a valid number"),
        }),
        None => Ok(default),
    }
}

fn positive_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> Result<Duration, ConfigError> {
    match parse_or(lookup, name, default)? {
        0 => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: "must be greater than zero".to_string(),
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}
