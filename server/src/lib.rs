#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]
// Life of a request:
// 1. POST /register or /login
//     - Validate email and password
//     - Hash or verify the password on the blocking pool
//     - Issue a signed token with a fresh jti
// 2. Protected routes
//     - Gate: bearer header -> verify token -> revocation check -> principal
//     - Handler receives the principal as a request extension
// 3. POST /user/logout
//     - Verify the token (expired tokens succeed as a no-op)
//     - Record the jti until the token's own expiry
//
// System components:
//  - Token codec (stateless)
//  - Revocation store (shared, swept in the background)
//  - Credential store (external collaborator)

pub mod api;
pub mod auth;
pub mod config;
pub mod credentials;
pub mod time;

#[cfg(test)]
mod e2e_tests;
#[cfg(test)]
mod testing;

pub use api::{AppState, router};
