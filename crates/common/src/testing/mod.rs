//! Testing utilities and helpers
//!
//! - **[`mocks`]**: Mock implementations of common traits
//!
//! ## Usage
//!
//! ```rust
//! use dropdoko_common::testing::MockCredentialStore;
//!
//! let store = MockCredentialStore::with_credential("dropdoko.access_token", "token");
//! assert_eq!(store.token("dropdoko.access_token").as_deref(), Some("token"));
//! ```

pub mod mocks;

pub use mocks::MockCredentialStore;
