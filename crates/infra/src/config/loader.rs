//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file into the process environment if one exists
//! 2. Attempts to load from environment variables
//! 3. If required variables are missing, falls back to loading from file
//! 4. Probes multiple paths for config files
//! 5. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `DROPDOKO_API_BASE_URL`: Backend base URL (required)
//! - `DROPDOKO_SERVICE_TOKEN`: Fixed service token (required)
//! - `DROPDOKO_SERVICE_HEADER`: Header carrying the service token
//! - `DROPDOKO_REQUEST_TIMEOUT_SECS`: Default per-request timeout
//! - `DROPDOKO_BACKGROUND_REFRESH_SECS`: Background refresh period, `0` disables
//! - `DROPDOKO_CREDENTIAL_KEY`: Storage key of the access credential
//! - `DROPDOKO_KEYCHAIN_SERVICE`: Keychain service name
//! - `DROPDOKO_LOG_LEVEL`: Default log filter
//! - `DROPDOKO_LOG_JSON`: Emit JSON logs (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./dropdoko.json` or `./dropdoko.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};

use dropdoko_domain::constants::{
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVICE_HEADER, ENV_API_BASE_URL,
    ENV_BACKGROUND_REFRESH_SECS, ENV_CREDENTIAL_KEY, ENV_KEYCHAIN_SERVICE, ENV_LOG_JSON,
    ENV_LOG_LEVEL, ENV_REQUEST_TIMEOUT_SECS, ENV_SERVICE_HEADER, ENV_SERVICE_TOKEN,
};
use dropdoko_domain::{ApiConfig, Config, DropDokoError, LoggingConfig, Result, SessionConfig};

use crate::errors::InfraError;

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `DropDokoError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing or invalid
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from the process environment
///
/// # Errors
/// Returns `DropDokoError::Config` if required variables are missing or
/// have invalid values.
pub fn load_from_env() -> Result<Config> {
    load_from_vars(|key| std::env::var(key).ok())
}

/// Load configuration from an arbitrary variable lookup
///
/// `lookup` returns the value of a variable, or `None` when it is unset.
///
/// # Errors
/// Returns `DropDokoError::Config` if required variables are missing or
/// have invalid values.
pub fn load_from_vars<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &str| {
        lookup(key).filter(|v| !v.trim().is_empty()).ok_or_else(|| {
            DropDokoError::Config(format!("Missing required environment variable: {}", key))
        })
    };

    let api = ApiConfig {
        base_url: required(ENV_API_BASE_URL)?,
        service_token: required(ENV_SERVICE_TOKEN)?,
        service_header: lookup(ENV_SERVICE_HEADER)
            .unwrap_or_else(|| DEFAULT_SERVICE_HEADER.to_string()),
        request_timeout_secs: parse_u64(
            ENV_REQUEST_TIMEOUT_SECS,
            lookup(ENV_REQUEST_TIMEOUT_SECS),
        )?
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
    };

    let mut session = SessionConfig::default();
    if let Some(secs) =
        parse_u64(ENV_BACKGROUND_REFRESH_SECS, lookup(ENV_BACKGROUND_REFRESH_SECS))?
    {
        session.background_refresh_secs = secs;
    }
    if let Some(key) = lookup(ENV_CREDENTIAL_KEY) {
        session.credential_key = key;
    }
    if let Some(service) = lookup(ENV_KEYCHAIN_SERVICE) {
        session.keychain_service = service;
    }

    let mut logging = LoggingConfig::default();
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        logging.level = level;
    }
    logging.json = parse_bool(lookup(ENV_LOG_JSON), logging.json);

    let config = Config { api, session, logging };
    validate(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `DropDokoError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing or invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DropDokoError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DropDokoError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DropDokoError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    validate(&config)?;
    Ok(config)
}

/// Check values serde cannot: URL shape and non-empty credentials.
///
/// # Errors
/// Returns `DropDokoError::Config` describing the first invalid field.
pub fn validate(config: &Config) -> Result<()> {
    let base_url = url::Url::parse(&config.api.base_url)
        .map_err(|e| DropDokoError::from(InfraError::from(e)))?;

    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(DropDokoError::Config(format!(
            "API base URL must be http or https, got {}",
            base_url.scheme()
        )));
    }
    if config.api.service_token.trim().is_empty() {
        return Err(DropDokoError::Config("Service token must not be empty".to_string()));
    }
    if config.api.service_header.trim().is_empty() {
        return Err(DropDokoError::Config("Service header name must not be empty".to_string()));
    }
    if config.api.request_timeout_secs == 0 {
        return Err(DropDokoError::Config("Request timeout must be positive".to_string()));
    }
    if config.session.credential_key.trim().is_empty() {
        return Err(DropDokoError::Config("Credential key must not be empty".to_string()));
    }

    Ok(())
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `DropDokoError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DropDokoError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DropDokoError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(DropDokoError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`,
///    `./dropdoko.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("dropdoko.json"),
        dir.join("dropdoko.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

fn parse_u64(key: &str, value: Option<String>) -> Result<Option<u64>> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|e| DropDokoError::Config(format!("Invalid value for {}: {}", key, e)))
        })
        .transpose()
}

/// Parse a boolean flag
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
/// Returns `default` if the value is unset.
fn parse_bool(value: Option<String>, default: bool) -> bool {
    value
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_bool() {
        for raw in ["1", "true", "YES", "on"] {
            assert!(parse_bool(Some(raw.to_string()), false), "{raw} should be true");
        }
        for raw in ["0", "false", "no", "off"] {
            assert!(!parse_bool(Some(raw.to_string()), true), "{raw} should be false");
        }
        assert!(parse_bool(None, true));
        assert!(!parse_bool(None, false));
    }

    #[test]
    fn test_load_from_vars_required_only() {
        let config = load_from_vars(vars(&[
            (ENV_API_BASE_URL, "https://api.dropdoko.com/api"),
            (ENV_SERVICE_TOKEN, "svc"),
        ]))
        .unwrap();

        assert_eq!(config.api.base_url, "https://api.dropdoko.com/api");
        assert_eq!(config.api.service_header, "x-api-key");
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.session, SessionConfig::default());
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_load_from_vars_all_set() {
        let config = load_from_vars(vars(&[
            (ENV_API_BASE_URL, "http://localhost:5000/api"),
            (ENV_SERVICE_TOKEN, "svc"),
            (ENV_SERVICE_HEADER, "x-service-key"),
            (ENV_REQUEST_TIMEOUT_SECS, "10"),
            (ENV_BACKGROUND_REFRESH_SECS, "0"),
            (ENV_CREDENTIAL_KEY, "admin.access_token"),
            (ENV_KEYCHAIN_SERVICE, "DropDokoAdmin"),
            (ENV_LOG_LEVEL, "debug"),
            (ENV_LOG_JSON, "true"),
        ]))
        .unwrap();

        assert_eq!(config.api.service_header, "x-service-key");
        assert_eq!(config.api.request_timeout_secs, 10);
        assert_eq!(config.session.background_refresh_secs, 0);
        assert_eq!(config.session.credential_key, "admin.access_token");
        assert_eq!(config.session.keychain_service, "DropDokoAdmin");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_load_from_vars_missing_required() {
        let err = load_from_vars(vars(&[(ENV_API_BASE_URL, "https://api.dropdoko.com")]))
            .unwrap_err();
        assert!(matches!(err, DropDokoError::Config(ref msg) if msg.contains(ENV_SERVICE_TOKEN)));
    }

    #[test]
    fn test_load_from_vars_invalid_number() {
        let err = load_from_vars(vars(&[
            (ENV_API_BASE_URL, "https://api.dropdoko.com"),
            (ENV_SERVICE_TOKEN, "svc"),
            (ENV_REQUEST_TIMEOUT_SECS, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, DropDokoError::Config(_)));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        for url in ["not a url", "ftp://files.dropdoko.com"] {
            let err = load_from_vars(vars(&[(ENV_API_BASE_URL, url), (ENV_SERVICE_TOKEN, "svc")]))
                .unwrap_err();
            assert!(matches!(err, DropDokoError::Config(_)), "{url} should be rejected");
        }
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(matches!(result, Err(DropDokoError::Config(_))));
    }

    #[test]
    fn test_parse_config_json() {
        let json_content = r#"{
            "api": { "base_url": "https://api.dropdoko.com/api", "service_token": "svc" }
        }"#;

        let config = parse_config(json_content, &PathBuf::from("test.json")).unwrap();
        assert_eq!(config.api.service_header, "x-api-key");
        assert_eq!(config.session.endpoints.refresh, "/auth/refresh");
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_content = r#"
[api]
base_url = "https://api.dropdoko.com/api"
service_token = "svc"
request_timeout_secs = 15

[session.endpoints]
refresh = "/auth/refresh-token"
"#;

        let config = parse_config(toml_content, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(config.api.request_timeout_secs, 15);
        assert_eq!(config.session.endpoints.refresh, "/auth/refresh-token");
        assert_eq!(config.session.endpoints.login, "/auth/login");
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", &PathBuf::from("test.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }
}
