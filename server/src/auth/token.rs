//! Session token issuance and verification.
//!
//! Tokens are HS256-signed JWTs carrying `sub` (principal), `jti` (token id),
//! `iat` and `exp`. No server-side session table exists; the only server
//! state that can invalidate a token early is the revocation store.
//!
//! # Pre-conditions
//! - The signing secret is a validated [`SigningSecret`].
//!
//! # Post-conditions
//! - `issue` produces a token whose `exp - iat` equals the configured lifetime.
//! - `parse` only returns claims for tokens signed with HS256 under our secret
//!   whose `exp` is strictly after the current time.
//!
//! # Invariants
//! - Tokens are never mutated after issuance.
//! - Parsing has no side effects; it depends only on the token, the secret and the clock.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Principal, SigningSecret};
use crate::time::TimeSource;

/// Claim set as it appears on the wire.
///
/// Every field is optional here so a missing claim can be reported by name
/// instead of as a generic decoding failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<u64>,
}

/// Verified claims of a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject, as written into the `sub` claim. Not yet parsed into a [`Principal`].
    pub subject: String,
    /// Unique token id (`jti`), used only for revocation bookkeeping.
    pub token_id: String,
    /// Issuance time, seconds since the Unix epoch.
    pub issued_at: u64,
    /// Expiry time, seconds since the Unix epoch.
    pub expires_at: u64,
}

impl SessionClaims {
    /// Parse the subject into a principal.
    pub fn principal(&self) -> Result<Principal, uuid::Error> {
        self.subject.parse()
    }
}

impl TryFrom<WireClaims> for SessionClaims {
    type Error = TokenError;

    fn try_from(wire: WireClaims) -> Result<Self, Self::Error> {
        let subject = wire
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or_else(|| TokenError::MissingClaim("sub".to_string()))?;
        let token_id = wire
            .jti
            .filter(|jti| !jti.is_empty())
            .ok_or_else(|| TokenError::MissingClaim("jti".to_string()))?;
        let issued_at = wire
            .iat
            .ok_or_else(|| TokenError::MissingClaim("iat".to_string()))?;
        let expires_at = wire
            .exp
            .ok_or_else(|| TokenError::MissingClaim("exp".to_string()))?;

        Ok(Self {
            subject,
            token_id,
            issued_at,
            expires_at,
        })
    }
}

impl From<&SessionClaims> for WireClaims {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            sub: Some(claims.subject.clone()),
            jti: Some(claims.token_id.clone()),
            iat: Some(claims.issued_at),
            exp: Some(claims.expires_at),
        }
    }
}

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact JWT serialization, suitable for `Authorization: Bearer`.
    pub token: String,
    pub claims: SessionClaims,
}

/// Error returned when a token fails verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token is not a well-formed JWT.
    Malformed,
    /// The signature does not match the shared secret.
    BadSignature,
    /// The token's `exp` is not after the current time.
    Expired,
    /// The header declares a signing algorithm other than HS256.
    WrongAlgorithm,
    /// A required claim is absent or empty.
    MissingClaim(String),
}

impl TokenError {
    /// Short machine-readable reason.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::BadSignature => "bad_signature",
            Self::Expired => "expired",
            Self::WrongAlgorithm => "wrong_algorithm",
            Self::MissingClaim(_) => "missing_claim",
        }
    }
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed token"),
            Self::BadSignature => write!(f, "invalid token signature"),
            Self::Expired => write!(f, "token has expired"),
            Self::WrongAlgorithm => write!(f, "unexpected token signing algorithm"),
            Self::MissingClaim(name) => write!(f, "missing '{name}' claim in token"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Error returned when a token cannot be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningError(pub String);

impl std::fmt::Display for SigningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to sign token: {}", self.0)
    }
}

impl std::error::Error for SigningError {}

/// Issues and parses HS256 session tokens.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
    clock: Arc<dyn TimeSource>,
}

impl TokenCodec {
    /// Create a codec signing with `secret` and issuing tokens valid for `lifetime`.
    #[must_use]
    pub fn new(secret: &SigningSecret, lifetime: Duration, clock: Arc<dyn TimeSource>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in `parse` against the injected clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
            clock,
        }
    }

    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a new token for `subject` with a fresh random token id.
    ///
    /// # Errors
    /// Returns `SigningError` only if the underlying signer fails.
    pub fn issue(&self, subject: Principal) -> Result<IssuedToken, SigningError> {
        let issued_at = self.clock.now_secs();
        let claims = SessionClaims {
            subject: subject.to_string(),
            token_id: Uuid::new_v4().to_string(),
            issued_at,
            expires_at: issued_at.saturating_add(self.lifetime.as_secs()),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &WireClaims::from(&claims),
            &self.encoding,
        )
        .map_err(|e| SigningError(e.to_string()))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify a token and extract its claims.
    ///
    /// # Errors
    /// Returns `TokenError` describing the first check that failed.
    pub fn parse(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let data =
            decode::<WireClaims>(token, &self.decoding, &self.validation).map_err(map_jwt_error)?;
        let claims = SessionClaims::try_from(data.claims)?;

        if claims.expires_at <= self.clock.now_secs() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("lifetime", &self.lifetime)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// Maps jsonwebtoken errors to our `TokenError` type.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => TokenError::BadSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => TokenError::WrongAlgorithm,
        ErrorKind::MissingRequiredClaim(name) => TokenError::MissingClaim(name.clone()),
        _ => TokenError::Malformed,
    }
}
