//! # DropDoko Domain
//!
//! Domain types shared by the DropDoko client crates.
//!
//! This crate contains:
//! - Domain error type and Result alias
//! - Configuration structures
//! - Backend data types (catalog, orders, coupons, accounts, locations)
//! - Constants and defaults
//!
//! ## Architecture
//! - No dependencies on other DropDoko crates
//! - Only serde-level external dependencies
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
