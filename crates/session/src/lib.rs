//! Session state for the campus-stay marketplace client
//!
//! Holds the signed-in user's tokens and decides what happens when a session
//! cannot be recovered. This crate performs no network I/O; the request
//! client in `api-client` reads and updates the store around each call.
//!
//! Session flow:
//! 1. Sign-in stores the pair via `TokenStore::set()` and the profile via
//!    `TokenStore::set_user()`
//! 2. Every request reads `TokenStore::get()` for the bearer credential
//! 3. A refreshed access token is written back with `TokenStore::set()`
//! 4. An unrecoverable 401 calls `navigator::end_session()`, which clears the
//!    store and redirects to sign-up

pub mod claims;
pub mod constants;
pub mod error;
pub mod navigator;
pub mod store;

pub use claims::{TokenClaims, decode_claims};
pub use constants::*;
pub use error::{Error, Result};
pub use navigator::{Location, Navigator, end_session, is_auth_route, redirect_to_sign_up};
pub use store::{CredentialPair, FileTokenStore, MemoryTokenStore, TokenStore, is_mock_token};
