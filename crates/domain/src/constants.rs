//! Application constants
//!
//! Centralized location for the defaults shared by the configuration loader,
//! the API client and the auth service.

// Backend request defaults
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SERVICE_HEADER: &str = "x-api-key";
pub const DEFAULT_USER_AGENT: &str = concat!("dropdoko-client/", env!("CARGO_PKG_VERSION"));

// Session defaults
pub const DEFAULT_CREDENTIAL_KEY: &str = "dropdoko.access_token";
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "DropDoko";
pub const DEFAULT_BACKGROUND_REFRESH_SECS: u64 = 600; // 10 minutes

// Credential-issuing and session endpoints
pub const LOGIN_PATH: &str = "/auth/login";
pub const SIGNUP_PATH: &str = "/auth/signup";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const LOGOUT_PATH: &str = "/auth/logout";

// Logging
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Environment variables read by the configuration loader
pub const ENV_API_BASE_URL: &str = "DROPDOKO_API_BASE_URL";
pub const ENV_SERVICE_TOKEN: &str = "DROPDOKO_SERVICE_TOKEN";
pub const ENV_SERVICE_HEADER: &str = "DROPDOKO_SERVICE_HEADER";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "DROPDOKO_REQUEST_TIMEOUT_SECS";
pub const ENV_BACKGROUND_REFRESH_SECS: &str = "DROPDOKO_BACKGROUND_REFRESH_SECS";
pub const ENV_CREDENTIAL_KEY: &str = "DROPDOKO_CREDENTIAL_KEY";
pub const ENV_KEYCHAIN_SERVICE: &str = "DROPDOKO_KEYCHAIN_SERVICE";
pub const ENV_LOG_LEVEL: &str = "DROPDOKO_LOG_LEVEL";
pub const ENV_LOG_JSON: &str = "DROPDOKO_LOG_JSON";
