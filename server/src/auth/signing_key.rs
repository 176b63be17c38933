//! Shared HMAC signing secret.
//!
//! # Pre-conditions
//! - The secret is supplied by configuration at startup, never compiled in.
//!
//! # Invariants
//! - A `SigningSecret` always holds at least [`MIN_SECRET_LEN`] bytes.
//! - The secret bytes never appear in `Debug` output.

/// Minimum secret length in bytes (256 bits).
pub const MIN_SECRET_LEN: usize = 32;

/// Error returned when a signing secret is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningSecretError {
    /// The secret is empty.
    Empty,
    /// The secret is shorter than [`MIN_SECRET_LEN`] bytes.
    TooShort {
        /// Length of the rejected secret.
        len: usize,
    },
}

impl std::fmt::Display for SigningSecretError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "signing secret must not be empty"),
            Self::TooShort { len } => write!(
                f,
                "signing secret is {len} bytes, at least {MIN_SECRET_LEN} are required"
            ),
        }
    }
}

impl std::error::Error for SigningSecretError {}

/// Validated HS256 secret shared by every process in a token namespace.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    /// Validate and wrap a secret.
    ///
    /// # Errors
    /// Returns `SigningSecretError::Empty` or `SigningSecretError::TooShort`.
    pub fn new(secret: Vec<u8>) -> Result<Self, SigningSecretError> {
        if secret.is_empty() {
            return Err(SigningSecretError::Empty);
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(SigningSecretError::TooShort { len: secret.len() });
        }
        Ok(Self(secret))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningSecret(<{} bytes redacted>)", self.0.len())
    }
}
