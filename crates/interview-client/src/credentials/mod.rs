//! Session credential management.
//!
//! This module owns the access/refresh token pair of the signed-in user.
//!
//! # Architecture
//!
//! - [`Credential`]: The token pair, always complete
//! - [`CredentialBackend`]: Durable key-value storage for the pair
//! - [`CredentialStore`]: Process-wide in-memory copy, seeded once from the backend

mod store;
mod types;

pub use store::{CredentialBackend, CredentialStore, FileBackend, MemoryBackend};
pub use types::{ACCESS_TOKEN_KEY, Credential, REFRESH_TOKEN_KEY, StoredKeys};
