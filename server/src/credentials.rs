//! Credential store collaborator.
//!
//! The auth core never owns account data. It reads credential records by
//! email and creates new accounts through [`CredentialStore`]; whatever
//! persists users (SQL, a directory service, ...) implements the trait.
//!
//! # Invariants
//! - `create_account` writes the credential record and the default profile
//!   atomically: either both exist afterwards or neither does.
//! - Emails are unique across records.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use serde::Serialize;

use crate::auth::Principal;

/// Role assigned to every profile created at registration.
pub const DEFAULT_PROFILE_ROLES: &str = "Personal Profile";

/// Stored account data, including the password digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub principal: Principal,
    pub email: String,
    /// Argon2 PHC digest. `None` for accounts that never set a password.
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Account fields supplied at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Profile attached one-to-one to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    #[serde(rename = "id")]
    pub principal: Principal,
    pub roles: String,
}

/// Values used to create the profile that accompanies a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDefaults {
    pub roles: String,
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            roles: DEFAULT_PROFILE_ROLES.to_string(),
        }
    }
}

/// Errors returned by a credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An account with this email already exists.
    DuplicateEmail,
    /// The backing store failed.
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEmail => write!(f, "an account with this email already exists"),
            Self::Unavailable(reason) => write!(f, "credential store unavailable: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Persistence of accounts and profiles, as seen by the session manager.
pub trait CredentialStore: Send + Sync {
    /// Look up a credential record by email. `Ok(None)` if no account uses it.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<CredentialRecord>, StoreError>> + Send;

    /// Create an account and its profile in one atomic write.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateEmail` if the email is taken; nothing is written.
    fn create_account(
        &self,
        account: NewAccount,
        profile: ProfileDefaults,
    ) -> impl Future<Output = Result<(CredentialRecord, Profile), StoreError>> + Send;

    /// Fetch the profile belonging to `principal`.
    fn find_profile(
        &self,
        principal: Principal,
    ) -> impl Future<Output = Result<Option<Profile>, StoreError>> + Send;
}

#[derive(Debug, Default)]
struct Accounts {
    by_email: HashMap<String, Principal>,
    records: HashMap<Principal, CredentialRecord>,
    profiles: HashMap<Principal, Profile>,
}

/// Process-local credential store.
///
/// One mutex guards records and profiles together, which makes
/// `create_account` atomic.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    accounts: Mutex<Accounts>,
}

impl InMemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an account created outside the registration flow, such as one
    /// provisioned without a password.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateEmail` if the email is taken.
    pub fn import(
        &self,
        record: CredentialRecord,
        profile: Option<Profile>,
    ) -> Result<(), StoreError> {
        let mut accounts = self.lock()?;
        if accounts.by_email.contains_key(&record.email) {
            return Err(StoreError::DuplicateEmail);
        }
        accounts
            .by_email
            .insert(record.email.clone(), record.principal);
        if let Some(profile) = profile {
            accounts.profiles.insert(record.principal, profile);
        }
        accounts.records.insert(record.principal, record);
        Ok(())
    }

    /// Number of stored accounts.
    pub fn account_count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.records.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Accounts>, StoreError> {
        self.accounts
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<CredentialRecord>, StoreError> {
        let accounts = self.lock()?;
        Ok(accounts
            .by_email
            .get(email)
            .and_then(|principal| accounts.records.get(principal))
            .cloned())
    }

    async fn create_account(
        &self,
        account: NewAccount,
        profile: ProfileDefaults,
    ) -> Result<(CredentialRecord, Profile), StoreError> {
        let mut accounts = self.lock()?;
        if accounts.by_email.contains_key(&account.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let principal = Principal::new_v4();
        let record = CredentialRecord {
            principal,
            email: account.email,
            password_hash: Some(account.password_hash),
            first_name: account.first_name,
            last_name: account.last_name,
        };
        let profile = Profile {
            principal,
            roles: profile.roles,
        };

        accounts.by_email.insert(record.email.clone(), principal);
        accounts.records.insert(principal, record.clone());
        accounts.profiles.insert(principal, profile.clone());

        Ok((record, profile))
    }

    async fn find_profile(&self, principal: Principal) -> Result<Option<Profile>, StoreError> {
        Ok(self.lock()?.profiles.get(&principal).cloned())
    }
}
