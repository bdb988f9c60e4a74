//! Platform keychain credential store
//!
//! Persists the session credential in the platform keychain (macOS Keychain,
//! Windows Credential Manager, Linux Secret Service) via `keyring`. Entries are
//! scoped by a service name so separate deployments never share a credential.
//!
//! ```no_run
//! use dropdoko_common::auth::{CredentialStore, KeychainCredentialStore, SessionCredential};
//!
//! # async fn example() -> Result<(), dropdoko_common::auth::CredentialStoreError> {
//! let store = KeychainCredentialStore::new("DropDoko");
//! store.store("dropdoko.access_token", &SessionCredential::new("token")).await?;
//! let loaded = store.load("dropdoko.access_token").await?;
//! assert!(loaded.is_some());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use keyring::Entry;
use tracing::debug;

use super::traits::CredentialStore;
use super::types::{CredentialStoreError, SessionCredential};

/// Keychain-backed [`CredentialStore`]
#[derive(Debug, Clone)]
pub struct KeychainCredentialStore {
    service_name: String,
}

impl KeychainCredentialStore {
    /// Create a store scoped to `service_name` (e.g. "DropDoko")
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    /// Service name entries are scoped to
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    // keyring calls block on platform IPC, so they run off the async workers.
    async fn with_entry<T, F>(&self, key: &str, op: F) -> Result<T, CredentialStoreError>
    where
        T: Send + 'static,
        F: FnOnce(Entry) -> Result<T, keyring::Error> + Send + 'static,
    {
        let service = self.service_name.clone();
        let account = key.to_string();

        tokio::task::spawn_blocking(move || {
            let entry = Entry::new(&service, &account).map_err(map_keyring_error)?;
            op(entry).map_err(map_keyring_error)
        })
        .await
        .map_err(|e| CredentialStoreError::AccessFailed(format!("keychain task failed: {e}")))?
    }
}

#[async_trait]
impl CredentialStore for KeychainCredentialStore {
    async fn load(&self, key: &str) -> Result<Option<SessionCredential>, CredentialStoreError> {
        debug!(service = %self.service_name, key = %key, "Loading credential from keychain");

        self.with_entry(key, |entry| match entry.get_password() {
            Ok(token) => Ok(Some(SessionCredential::new(token))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(other) => Err(other),
        })
        .await
    }

    async fn store(
        &self,
        key: &str,
        credential: &SessionCredential,
    ) -> Result<(), CredentialStoreError> {
        debug!(service = %self.service_name, key = %key, "Storing credential in keychain");

        let token = credential.clone();
        self.with_entry(key, move |entry| entry.set_password(token.expose())).await
    }

    async fn delete(&self, key: &str) -> Result<(), CredentialStoreError> {
        debug!(service = %self.service_name, key = %key, "Deleting credential from keychain");

        self.with_entry(key, |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(other) => Err(other),
        })
        .await
    }
}

fn map_keyring_error(err: keyring::Error) -> CredentialStoreError {
    match err {
        keyring::Error::NoStorageAccess(inner) => {
            CredentialStoreError::Unavailable(format!("no keychain access: {inner}"))
        }
        keyring::Error::PlatformFailure(inner) => {
            CredentialStoreError::Unavailable(format!("keychain platform failure: {inner}"))
        }
        other => CredentialStoreError::AccessFailed(other.to_string()),
    }
}
