//! DropDoko backend API client
//!
//! This module provides the authenticated HTTP client for the DropDoko
//! backend together with the session lifecycle around it.
//!
//! # Architecture
//!
//! - Uses the single-attempt [`HttpClient`](crate::http::HttpClient) (no
//!   direct reqwest outside `http`)
//! - Bearer credential from [`SessionHandle`], persisted through a
//!   `CredentialStore`
//! - Single-flight refresh on 401 with a FIFO queue of waiting requests
//! - Cancelable background refresh owned by [`ApiAuthService`]
//! - Typed storefront ([`StoreCommands`]) and back-office ([`AdminCommands`])
//!   wrappers
//!
//! # Invariants
//!
//! - At most one refresh call in flight per client
//! - A request is replayed at most once
//! - 5xx and network failures are never retried

pub mod admin;
pub mod auth;
pub mod client;
pub mod commands;
pub mod errors;
pub mod refresh;
pub mod request;
pub mod scheduler;
pub mod session;

pub use admin::AdminCommands;
pub use auth::ApiAuthService;
pub use client::{ApiClient, ApiClientBuilder, ApiClientConfig};
pub use commands::StoreCommands;
pub use errors::{ApiError, ApiErrorCategory};
pub use refresh::{RefreshOutcome, RefreshTrigger};
pub use request::{ApiRequest, ApiResponse};
pub use scheduler::{RefreshScheduler, SchedulerConfig, SchedulerError};
pub use session::{LogOnlyTerminationHandler, SessionHandle, SessionTerminationHandler};
