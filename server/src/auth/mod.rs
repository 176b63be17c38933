//! Authentication and session revocation.
//!
//! Tokens are stateless HS256 JWTs; revocation is the one piece of shared
//! state, consulted by the gate on every protected request.
//!
//! # Pre-conditions
//! - The signing secret is at least [`MIN_SECRET_LEN`] bytes.
//!
//! # Post-conditions
//! - A request passes the gate only with a correctly signed, unexpired,
//!   unrevoked token whose subject is a valid principal.
//!
//! # Invariants
//! - Password digests and plaintexts never leave this module except as
//!   opaque PHC strings handed to the credential store.

pub mod error;
pub mod gate;
pub mod password;
pub mod principal;
pub mod revocation;
pub mod session;
pub mod signing_key;
pub mod sweeper;
pub mod token;

pub use error::{AuthError, SessionError};
pub use gate::{AuthGate, BEARER_PREFIX, Rejection, bearer_token, require_principal};
pub use password::{CredentialHasher, HashCost, HashError, VerifyError};
pub use principal::Principal;
pub use revocation::{InMemoryRevocationStore, RevocationError, RevocationStore};
pub use session::{LogoutOutcome, MIN_PASSWORD_LEN, Registration, Session, SessionManager};
pub use signing_key::{MIN_SECRET_LEN, SigningSecret, SigningSecretError};
pub use sweeper::{SweeperConfig, spawn_revocation_sweeper};
pub use token::{IssuedToken, SessionClaims, SigningError, TokenCodec, TokenError};
