//! Configuration structures
//!
//! Populated by the infra configuration loader from environment variables or
//! a JSON/TOML file. Only `api.base_url` and `api.service_token` are required;
//! everything else falls back to the defaults in [`crate::constants`].

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BACKGROUND_REFRESH_SECS, DEFAULT_CREDENTIAL_KEY, DEFAULT_KEYCHAIN_SERVICE,
    DEFAULT_LOG_LEVEL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVICE_HEADER, LOGIN_PATH,
    LOGOUT_PATH, REFRESH_PATH, SIGNUP_PATH,
};

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend connection settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend REST API (e.g. "https://api.dropdoko.com/api")
    pub base_url: String,
    /// Fixed service-identifying token sent with every request
    pub service_token: String,
    /// Header name carrying `service_token`
    #[serde(default = "default_service_header")]
    pub service_header: String,
    /// Default per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// Hand-written so the service token never ends up in logs.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("service_token", &"***")
            .field("service_header", &self.service_header)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Session and credential lifecycle settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Key the access credential is stored under
    #[serde(default = "default_credential_key")]
    pub credential_key: String,
    /// Keychain service name used by the persistent credential store
    #[serde(default = "default_keychain_service")]
    pub keychain_service: String,
    /// Background refresh interval; `0` disables the background task
    #[serde(default = "default_background_refresh_secs")]
    pub background_refresh_secs: u64,
    #[serde(default)]
    pub endpoints: AuthEndpoints,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            credential_key: default_credential_key(),
            keychain_service: default_keychain_service(),
            background_refresh_secs: default_background_refresh_secs(),
            endpoints: AuthEndpoints::default(),
        }
    }
}

/// Paths of the credential-issuing and session endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEndpoints {
    #[serde(default = "default_login_path")]
    pub login: String,
    #[serde(default = "default_signup_path")]
    pub signup: String,
    #[serde(default = "default_refresh_path")]
    pub refresh: String,
    #[serde(default = "default_logout_path")]
    pub logout: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: default_login_path(),
            signup: default_signup_path(),
            refresh: default_refresh_path(),
            logout: default_logout_path(),
        }
    }
}

/// Logging output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), json: false }
    }
}

fn default_service_header() -> String {
    DEFAULT_SERVICE_HEADER.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_credential_key() -> String {
    DEFAULT_CREDENTIAL_KEY.to_string()
}

fn default_keychain_service() -> String {
    DEFAULT_KEYCHAIN_SERVICE.to_string()
}

fn default_background_refresh_secs() -> u64 {
    DEFAULT_BACKGROUND_REFRESH_SECS
}

fn default_login_path() -> String {
    LOGIN_PATH.to_string()
}

fn default_signup_path() -> String {
    SIGNUP_PATH.to_string()
}

fn default_refresh_path() -> String {
    REFRESH_PATH.to_string()
}

fn default_logout_path() -> String {
    LOGOUT_PATH.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
