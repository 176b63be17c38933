//! Password hashing and verification.
//!
//! Digests are Argon2id PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`),
//! so every digest carries its own salt and cost parameters. Verification
//! reads those parameters back out of the digest, which lets the configured
//! cost change without invalidating stored hashes.
//!
//! # Invariants
//! - Every call to [`CredentialHasher::hash`] draws a fresh 16-byte salt from the OS.
//! - The hasher holds no mutable state and is safe to share between threads.

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::TryRngCore;
use rand::rngs::OsRng;

/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// Argon2 work-factor parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory size in KiB.
    pub memory_kib: u32,
    /// Number of passes over memory.
    pub iterations: u32,
    /// Degree of parallelism (lanes).
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Error returned when a password cannot be hashed.
///
/// Only raised for misconfigured cost parameters or an unavailable entropy source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// The cost parameters are outside the ranges Argon2 accepts.
    InvalidCost(String),
    /// The OS random number generator failed.
    Entropy(String),
    /// Argon2 failed while computing the digest.
    Hashing(String),
}

impl std::fmt::Display for HashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCost(reason) => write!(f, "invalid hash cost: {reason}"),
            Self::Entropy(reason) => write!(f, "entropy source failed: {reason}"),
            Self::Hashing(reason) => write!(f, "password hashing failed: {reason}"),
        }
    }
}

impl std::error::Error for HashError {}

/// Error returned when a password does not verify against a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    /// The password is not the preimage of the digest.
    Mismatch,
    /// The digest is not a parseable PHC string.
    MalformedDigest,
    /// The digest was produced by an algorithm other than Argon2id.
    UnsupportedAlgorithm,
}

impl std::fmt::Display for VerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mismatch => write!(f, "password does not match"),
            Self::MalformedDigest => write!(f, "malformed password digest"),
            Self::UnsupportedAlgorithm => write!(f, "unsupported password digest algorithm"),
        }
    }
}

impl std::error::Error for VerifyError {}

/// One-way password hasher.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// Create a hasher with the given work factor.
    ///
    /// # Errors
    /// Returns `HashError::InvalidCost` if Argon2 rejects the parameters.
    pub fn new(cost: HashCost) -> Result<Self, HashError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| HashError::InvalidCost(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash `plaintext` with a fresh random salt.
    ///
    /// Two calls with the same input never return the same digest.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let mut salt_bytes = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|e| HashError::Entropy(e.to_string()))?;
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| HashError::Hashing(e.to_string()))?;

        let digest = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| HashError::Hashing(e.to_string()))?;
        Ok(digest.to_string())
    }

    /// Verify `plaintext` against a digest produced by [`hash`](Self::hash).
    ///
    /// The final comparison is constant-time. Any failure, including a
    /// digest that cannot be parsed, is reported as a `VerifyError`.
    pub fn verify(&self, plaintext: &str, digest: &str) -> Result<(), VerifyError> {
        let parsed = PasswordHash::new(digest).map_err(|_| VerifyError::MalformedDigest)?;
        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return Err(VerifyError::UnsupportedAlgorithm);
        }

        self.argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .map_err(|e| match e {
                argon2::password_hash::Error::Password => VerifyError::Mismatch,
                _ => VerifyError::MalformedDigest,
            })
    }
}
