//! End-to-end tests over HTTP.
//!
//! Each test starts its own server on an ephemeral port with a manual
//! clock, then drives it with a real HTTP client.

#![cfg(test)]

mod helpers;

mod test_bad_credentials;
mod test_concurrent_revocation;
mod test_gate_headers;
mod test_logout_revocation;
mod test_register_login;
mod test_token_expiry;
