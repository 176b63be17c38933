//! Register, login and logout, composed from the hasher, codec and stores.
//!
//! # Pre-conditions
//! - The credential store owns account persistence; this module never
//!   writes records directly.
//!
//! # Post-conditions
//! - `register` and `login` return a freshly issued token bound to the
//!   account's principal.
//! - A `logout` that returns `LogoutOutcome::Revoked` is observed by every
//!   subsequent gate check.
//!
//! # Invariants
//! - Password hashing and verification run on the blocking pool, never on
//!   an async worker.
//! - Plaintext passwords are never logged.

use std::sync::Arc;

use tokio::sync::OnceCell;
use uuid::Uuid;

use super::error::{AuthError, SessionError};
use super::password::{CredentialHasher, VerifyError};
use super::{IssuedToken, Principal, RevocationStore, TokenCodec, TokenError};
use crate::credentials::{CredentialRecord, CredentialStore, NewAccount, Profile, ProfileDefaults};

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Input to [`SessionManager::register`].
#[derive(Clone, PartialEq, Eq)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

/// An authenticated session: the account, its profile, and the token issued for it.
#[derive(Debug, Clone)]
pub struct Session {
    pub account: CredentialRecord,
    pub profile: Profile,
    pub token: IssuedToken,
}

impl Session {
    #[must_use]
    pub const fn principal(&self) -> Principal {
        self.account.principal
    }
}

/// Result of a successful logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// The token id was added to the revocation list.
    Revoked,
    /// The token had already expired; nothing needed recording.
    AlreadyExpired,
}

/// Account lifecycle operations.
pub struct SessionManager<S> {
    hasher: CredentialHasher,
    codec: Arc<TokenCodec>,
    revocations: Arc<dyn RevocationStore>,
    credentials: Arc<S>,
    /// Digest of a random secret, verified against when no real digest exists.
    decoy_digest: OnceCell<String>,
}

impl<S: CredentialStore> SessionManager<S> {
    #[must_use]
    pub fn new(
        hasher: CredentialHasher,
        codec: Arc<TokenCodec>,
        revocations: Arc<dyn RevocationStore>,
        credentials: Arc<S>,
    ) -> Self {
        Self {
            hasher,
            codec,
            revocations,
            credentials,
            decoy_digest: OnceCell::new(),
        }
    }

    /// Create an account with `profile` and issue its first token.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed email or a password shorter than
    ///   [`MIN_PASSWORD_LEN`]; nothing is stored.
    /// - `EmailTaken` if the email already has an account.
    /// - `Infrastructure` if hashing, storage or signing fails.
    pub async fn register(
        &self,
        registration: Registration,
        profile: ProfileDefaults,
    ) -> Result<Session, SessionError> {
        validate_email(&registration.email)?;
        validate_password(&registration.password)?;

        let password_hash = self.hash_password(registration.password).await?;
        let account = NewAccount {
            email: registration.email,
            password_hash,
            first_name: registration.first_name.filter(|name| !name.is_empty()),
            last_name: registration.last_name.filter(|name| !name.is_empty()),
        };

        let (account, profile) = self.credentials.create_account(account, profile).await?;
        let token = self.codec.issue(account.principal)?;

        tracing::info!(principal = %account.principal, "registered account");
        Ok(Session {
            account,
            profile,
            token,
        })
    }

    /// Verify `email` and `password` and issue a token.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed email or short password.
    /// - `Auth(NoSuchUser)` if no account uses `email`.
    /// - `Auth(BadCredentials)` if the password does not verify or the
    ///   account has none.
    /// - `Infrastructure` if the account has no profile, or a dependency fails.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        validate_email(email)?;
        validate_password(password)?;

        let Some(account) = self.credentials.find_by_email(email).await? else {
            tracing::debug!("login for unknown email");
            self.verify_against_decoy(password).await?;
            return Err(AuthError::NoSuchUser.into());
        };

        let Some(digest) = account.password_hash.clone() else {
            tracing::debug!(principal = %account.principal, "login for account without a password");
            self.verify_against_decoy(password).await?;
            return Err(AuthError::BadCredentials.into());
        };

        if let Err(e) = self.verify_password(password.to_string(), digest).await? {
            tracing::debug!(principal = %account.principal, "password rejected: {e}");
            return Err(AuthError::BadCredentials.into());
        }

        let principal = account.principal;
        let Some(profile) = self.credentials.find_profile(principal).await? else {
            return Err(SessionError::Infrastructure(format!("account {principal} has no profile")));
        };
        let token = self.codec.issue(principal)?;

        tracing::info!(%principal, "logged in");
        Ok(Session {
            account,
            profile,
            token,
        })
    }

    /// Revoke the token presented by the caller.
    ///
    /// An already expired token is accepted: it can no longer pass the gate,
    /// so logging it out again is a no-op.
    ///
    /// # Errors
    ///
    /// - `Auth(InvalidToken)` if the token fails verification for any reason
    ///   other than expiry.
    /// - `Infrastructure` if the revocation store fails.
    pub fn logout(&self, token: &str) -> Result<LogoutOutcome, SessionError> {
        let claims = match self.codec.parse(token) {
            Ok(claims) => claims,
            Err(TokenError::Expired) => return Ok(LogoutOutcome::AlreadyExpired),
            Err(e) => return Err(AuthError::InvalidToken(e).into()),
        };

        self.revocations.revoke(&claims.token_id, claims.expires_at)?;

        tracing::info!(
            subject = %claims.subject,
            token_id = %claims.token_id,
            "revoked token"
        );
        Ok(LogoutOutcome::Revoked)
    }

    /// Verify `password` against a decoy digest and discard the outcome, so a
    /// login with no real digest to check costs one verification like any other.
    async fn verify_against_decoy(&self, password: &str) -> Result<(), SessionError> {
        let digest = self
            .decoy_digest
            .get_or_try_init(|| self.hash_password(Uuid::new_v4().to_string()))
            .await?;
        let _ = self.verify_password(password.to_string(), digest.clone()).await?;
        Ok(())
    }

    async fn hash_password(&self, password: String) -> Result<String, SessionError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| SessionError::Infrastructure(format!("hashing task failed: {e}")))?
            .map_err(SessionError::from)
    }

    async fn verify_password(
        &self,
        password: String,
        digest: String,
    ) -> Result<Result<(), VerifyError>, SessionError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| SessionError::Infrastructure(format!("verification task failed: {e}")))
    }
}

impl<S> std::fmt::Debug for SessionManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("hasher", &self.hasher)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

fn validate_email(email: &str) -> Result<(), SessionError> {
    if email.is_empty() {
        return Err(SessionError::Validation("email is required".to_string()));
    }

    let well_formed = !email.chars().any(char::is_whitespace)
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && domain.split('.').all(|label| !label.is_empty())
        });

    if well_formed {
        Ok(())
    } else {
        Err(SessionError::Validation(
            "email must be a valid email address".to_string(),
        ))
    }
}

fn validate_password(password: &str) -> Result<(), SessionError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(SessionError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
