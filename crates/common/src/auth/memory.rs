//! Process-local credential store
//!
//! Keeps credentials for the lifetime of the process only. Suitable for
//! headless tools and CI where no platform keychain is available.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::traits::CredentialStore;
use super::types::{CredentialStoreError, SessionCredential};

/// In-memory [`CredentialStore`]
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    entries: RwLock<HashMap<String, SessionCredential>>,
}

impl InMemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self, key: &str) -> Result<Option<SessionCredential>, CredentialStoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn store(
        &self,
        key: &str,
        credential: &SessionCredential,
    ) -> Result<(), CredentialStoreError> {
        self.entries.write().insert(key.to_string(), credential.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CredentialStoreError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_loads_and_deletes() {
        let store = InMemoryCredentialStore::new();
        assert_eq!(store.load("k").await.unwrap(), None);

        store.store("k", &SessionCredential::new("t1")).await.unwrap();
        assert_eq!(store.load("k").await.unwrap(), Some(SessionCredential::new("t1")));

        store.store("k", &SessionCredential::new("t2")).await.unwrap();
        assert_eq!(store.load("k").await.unwrap(), Some(SessionCredential::new("t2")));

        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        assert_eq!(store.load("k").await.unwrap(), None);
    }
}
