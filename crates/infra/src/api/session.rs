//! Session credential cache and termination port
//!
//! [`SessionHandle`] is the single owner of the "current" bearer credential.
//! The cached copy is read synchronously before every request; replacements
//! are written to the cache first and then persisted through a
//! [`CredentialStore`].

use std::sync::Arc;

use dropdoko_common::auth::{CredentialStore, KeychainCredentialStore, SessionCredential};
use dropdoko_domain::{DropDokoError, SessionConfig};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::errors::ApiError;
use crate::errors::InfraError;

/// Port invoked when a session ends because its credential could not be
/// refreshed. Typically wired to navigation back to a login screen.
pub trait SessionTerminationHandler: Send + Sync {
    fn on_session_terminated(&self, reason: &str);
}

impl<F> SessionTerminationHandler for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_session_terminated(&self, reason: &str) {
        self(reason)
    }
}

/// Default handler: records the termination and does nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyTerminationHandler;

impl SessionTerminationHandler for LogOnlyTerminationHandler {
    fn on_session_terminated(&self, reason: &str) {
        warn!(reason, "session terminated; no termination handler installed");
    }
}

pub struct SessionHandle {
    current: RwLock<Option<SessionCredential>>,
    store: Arc<dyn CredentialStore>,
    key: String,
    on_terminated: Arc<dyn SessionTerminationHandler>,
}

impl SessionHandle {
    pub fn new(store: Arc<dyn CredentialStore>, key: impl Into<String>) -> Self {
        Self {
            current: RwLock::new(None),
            store,
            key: key.into(),
            on_terminated: Arc::new(LogOnlyTerminationHandler),
        }
    }

    /// Session persisted in the platform keychain under the configured
    /// service name and key.
    pub fn keychain(config: &SessionConfig) -> Self {
        let store = KeychainCredentialStore::new(config.keychain_service.clone());
        Self::new(Arc::new(store), config.credential_key.clone())
    }

    pub fn with_termination_handler(mut self, handler: Arc<dyn SessionTerminationHandler>) -> Self {
        self.on_terminated = handler;
        self
    }

    /// Storage key the credential is persisted under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Snapshot of the current credential
    pub fn current(&self) -> Option<SessionCredential> {
        self.current.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }

    /// Load a persisted credential into the cache.
    ///
    /// Returns `true` when one was found.
    pub async fn restore(&self) -> Result<bool, ApiError> {
        let loaded = self.store.load(&self.key).await.map_err(store_error)?;
        let found = loaded.as_ref().is_some_and(|credential| !credential.is_empty());

        *self.current.write() = loaded.filter(|credential| !credential.is_empty());
        debug!(found, "restored session credential");
        Ok(found)
    }

    /// Make `credential` current and persist it.
    ///
    /// The cache is updated before the store is touched, so requests issued
    /// concurrently already see the new credential. A persistence failure is
    /// returned but leaves the cached credential in place.
    pub async fn replace(&self, credential: SessionCredential) -> Result<(), ApiError> {
        *self.current.write() = Some(credential.clone());
        self.store.store(&self.key, &credential).await.map_err(store_error)?;
        debug!("session credential replaced");
        Ok(())
    }

    /// Forget the current credential, both cached and persisted.
    pub async fn clear(&self) -> Result<(), ApiError> {
        self.current.write().take();
        self.store.delete(&self.key).await.map_err(store_error)?;
        info!("session credential cleared");
        Ok(())
    }

    /// Drop the cached credential without touching the store.
    pub(crate) fn forget(&self) {
        self.current.write().take();
    }

    pub(crate) fn terminate(&self, reason: &str) {
        info!(reason, "session terminated");
        self.on_terminated.on_session_terminated(reason);
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("key", &self.key)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

fn store_error(err: dropdoko_common::auth::CredentialStoreError) -> ApiError {
    let infra: InfraError = err.into();
    ApiError::from(DropDokoError::from(infra))
}
