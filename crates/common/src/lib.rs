//! Common utilities shared across DropDoko crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - default: credential types, the `CredentialStore` seam, in-memory store
//! - `platform`: platform keychain credential store
//! - `test-utils`: mock implementations for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
pub use auth::{CredentialStore, CredentialStoreError, SessionCredential};
