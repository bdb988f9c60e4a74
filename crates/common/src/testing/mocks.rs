//! Mock implementations for testing
//!
//! Provides in-memory stand-ins for external dependencies so API client tests
//! stay deterministic and never touch the platform keychain.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::auth::{CredentialStore, CredentialStoreError, SessionCredential};

type StorageData = Arc<Mutex<HashMap<String, String>>>;

/// Mock credential store with call counters and write-failure injection
///
/// Clones share the same storage and counters, so a test can hand one clone to
/// the client and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MockCredentialStore {
    storage: StorageData,
    store_calls: Arc<AtomicUsize>,
    delete_calls: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl MockCredentialStore {
    /// Create an empty mock store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock store already holding `token` under `key`
    #[must_use]
    pub fn with_credential(key: &str, token: &str) -> Self {
        let store = Self::new();
        store.storage.lock().insert(key.to_string(), token.to_string());
        store
    }

    /// Raw token currently stored under `key`
    #[must_use]
    pub fn token(&self, key: &str) -> Option<String> {
        self.storage.lock().get(key).cloned()
    }

    /// Number of successful `store` calls
    #[must_use]
    pub fn store_calls(&self) -> usize {
        self.store_calls.load(Ordering::SeqCst)
    }

    /// Number of successful `delete` calls
    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Make subsequent `store`/`delete` calls fail
    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), CredentialStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CredentialStoreError::AccessFailed("mock write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn load(&self, key: &str) -> Result<Option<SessionCredential>, CredentialStoreError> {
        Ok(self.storage.lock().get(key).map(SessionCredential::new))
    }

    async fn store(
        &self,
        key: &str,
        credential: &SessionCredential,
    ) -> Result<(), CredentialStoreError> {
        self.check_writable()?;
        self.storage.lock().insert(key.to_string(), credential.expose().to_string());
        self.store_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CredentialStoreError> {
        self.check_writable()?;
        self.storage.lock().remove(key);
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
