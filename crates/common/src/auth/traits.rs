//! Traits for credential persistence
//!
//! These traits enable dependency injection and testing by abstracting the
//! storage backend (platform keychain, memory) away from the API client.

use async_trait::async_trait;

use super::types::{CredentialStoreError, SessionCredential};

/// Persistent key-value store for the session credential
///
/// Implementations must be safe to share across tasks. The API client keeps
/// its own in-memory copy and only touches the store on load, replace and
/// clear.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the credential stored under `key`
    ///
    /// # Returns
    /// `None` when nothing is stored under `key`
    ///
    /// # Errors
    /// Returns error if the backing store cannot be read
    async fn load(&self, key: &str) -> Result<Option<SessionCredential>, CredentialStoreError>;

    /// Store (or overwrite) the credential under `key`
    ///
    /// # Errors
    /// Returns error if the backing store rejects the write
    async fn store(&self, key: &str, credential: &SessionCredential)
        -> Result<(), CredentialStoreError>;

    /// Remove the credential stored under `key` (idempotent)
    ///
    /// # Errors
    /// Returns error if the backing store rejects the delete
    async fn delete(&self, key: &str) -> Result<(), CredentialStoreError>;
}
