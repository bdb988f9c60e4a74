//! Conversions from external infrastructure errors into domain errors.

use dropdoko_common::auth::CredentialStoreError;
use dropdoko_domain::DropDokoError;
use reqwest::Error as HttpError;
use url::ParseError as UrlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub DropDokoError);

impl From<InfraError> for DropDokoError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<DropDokoError> for InfraError {
    fn from(value: DropDokoError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoDropDokoError {
    fn into_dropdoko(self) -> DropDokoError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → DropDokoError */
/* -------------------------------------------------------------------------- */

impl IntoDropDokoError for HttpError {
    fn into_dropdoko(self) -> DropDokoError {
        if self.is_timeout() {
            return DropDokoError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return DropDokoError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return DropDokoError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() || self.is_body() {
            return DropDokoError::Network(format!("HTTP response body unreadable: {self}"));
        }

        DropDokoError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_dropdoko())
    }
}

/* -------------------------------------------------------------------------- */
/* CredentialStoreError → DropDokoError */
/* -------------------------------------------------------------------------- */

impl IntoDropDokoError for CredentialStoreError {
    fn into_dropdoko(self) -> DropDokoError {
        match self {
            CredentialStoreError::AccessFailed(message) => {
                DropDokoError::Storage(format!("credential store access failed: {message}"))
            }
            CredentialStoreError::Unavailable(message) => {
                DropDokoError::Storage(format!("credential store unavailable: {message}"))
            }
        }
    }
}

impl From<CredentialStoreError> for InfraError {
    fn from(value: CredentialStoreError) -> Self {
        InfraError(value.into_dropdoko())
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → DropDokoError */
/* -------------------------------------------------------------------------- */

impl IntoDropDokoError for UrlError {
    fn into_dropdoko(self) -> DropDokoError {
        DropDokoError::Config(format!("invalid URL: {self}"))
    }
}

impl From<UrlError> for InfraError {
    fn from(value: UrlError) -> Self {
        InfraError(value.into_dropdoko())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
