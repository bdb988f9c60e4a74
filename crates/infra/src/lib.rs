//! # DropDoko Infrastructure
//!
//! I/O-facing implementations for the DropDoko client.
//!
//! This crate contains:
//! - The authenticated backend API client with single-flight refresh
//! - Session lifecycle (login, logout, background refresh)
//! - HTTP transport over reqwest
//! - Configuration loading from environment and files
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Data types and configuration shapes come from `dropdoko-domain`
//! - Credential persistence goes through the `CredentialStore` seam in
//!   `dropdoko-common`

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{
    AdminCommands, ApiAuthService, ApiClient, ApiClientBuilder, ApiClientConfig, ApiError,
    ApiErrorCategory, ApiRequest, ApiResponse, RefreshOutcome, RefreshTrigger, SessionHandle,
    SessionTerminationHandler, StoreCommands,
};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::init_tracing;
