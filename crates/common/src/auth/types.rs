//! Session credential types
//!
//! The access credential is an opaque bearer token. It is wrapped so that it
//! is zeroed on drop and never rendered by `Debug`/`Display`.

use std::fmt;

use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Opaque bearer credential for the current session
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionCredential {
    token: String,
}

impl SessionCredential {
    /// Wrap a raw bearer token
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    /// Expose the raw token
    ///
    /// Only for building the `Authorization` header or persisting the value;
    /// never log the result.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }
}

// Not constant-time; used to detect whether a refresh replaced the token a
// request was sent with, not to authenticate anything.
impl PartialEq for SessionCredential {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl Eq for SessionCredential {}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionCredential(***)")
    }
}

impl fmt::Display for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

/// Credential storage failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialStoreError {
    /// Backing store rejected or failed the operation
    #[error("credential store access failed: {0}")]
    AccessFailed(String),

    /// Backing store is not usable on this platform/session
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}
