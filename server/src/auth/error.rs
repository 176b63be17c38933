//! Errors surfaced by the session manager.
//!
//! Three classes, matching how callers must react:
//! - `Validation`: the request itself is unusable (4xx, safe to show).
//! - `Auth` / `EmailTaken`: credentials or tokens were refused (4xx).
//! - `Infrastructure`: hashing, signing or storage failed (5xx, detail is logged, not shown).

use super::TokenError;
use super::password::HashError;
use super::revocation::RevocationError;
use super::token::SigningError;
use crate::credentials::StoreError;

/// Authentication failures.
///
/// `NoSuchUser` and `BadCredentials` are distinct for logging only; both
/// display the same message so a caller cannot tell which half was wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No account exists for the email.
    NoSuchUser,
    /// The password did not verify, or the account has no password.
    BadCredentials,
    /// The presented token failed verification.
    InvalidToken(TokenError),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSuchUser | Self::BadCredentials => write!(f, "invalid email or password"),
            Self::InvalidToken(e) => write!(f, "invalid token: {e}"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidToken(e) => Some(e),
            Self::NoSuchUser | Self::BadCredentials => None,
        }
    }
}

/// Errors returned by [`SessionManager`](super::SessionManager) operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Malformed input.
    Validation(String),
    /// Credentials or token refused.
    Auth(AuthError),
    /// Registration with an email that already has an account.
    EmailTaken,
    /// A dependency failed; not recoverable by the caller.
    Infrastructure(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "{message}"),
            Self::Auth(e) => write!(f, "{e}"),
            Self::EmailTaken => write!(f, "an account with this email already exists"),
            Self::Infrastructure(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Auth(e) => Some(e),
            Self::Validation(_) | Self::EmailTaken | Self::Infrastructure(_) => None,
        }
    }
}

impl From<AuthError> for SessionError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

impl From<HashError> for SessionError {
    fn from(e: HashError) -> Self {
        Self::Infrastructure(e.to_string())
    }
}

impl From<SigningError> for SessionError {
    fn from(e: SigningError) -> Self {
        Self::Infrastructure(e.to_string())
    }
}

impl From<RevocationError> for SessionError {
    fn from(e: RevocationError) -> Self {
        Self::Infrastructure(e.to_string())
    }
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => Self::EmailTaken,
            StoreError::Unavailable(_) => Self::Infrastructure(e.to_string()),
        }
    }
}
