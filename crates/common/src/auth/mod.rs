//! Session credential storage
//!
//! The API client holds the current bearer credential in memory and persists
//! it through a [`CredentialStore`] so it survives restarts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │   CredentialStore    │  trait (load / store / delete)
//! └──────────┬───────────┘
//!            │
//!            ├──► KeychainCredentialStore  (platform keychain, `platform` feature)
//!            ├──► InMemoryCredentialStore  (process lifetime)
//!            └──► MockCredentialStore      (tests, `test-utils` feature)
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: `SessionCredential`, `CredentialStoreError`
//! - **[`traits`]**: the `CredentialStore` seam
//! - **[`memory`]**: in-memory implementation
//! - **`keychain`**: platform keychain implementation

#[cfg(feature = "platform")]
mod keychain;
pub mod memory;
pub mod traits;
pub mod types;

#[cfg(feature = "platform")]
pub use keychain::KeychainCredentialStore;
pub use memory::InMemoryCredentialStore;
pub use traits::CredentialStore;
pub use types::{CredentialStoreError, SessionCredential};
