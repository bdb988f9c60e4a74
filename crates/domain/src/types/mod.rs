//! Backend data types
//!
//! Serde models for the JSON exchanged with the DropDoko backend. Field names
//! follow the backend's camelCase convention and Mongo-style `_id` keys are
//! accepted wherever an `id` is expected.

pub mod account;
pub mod auth;
pub mod catalog;
pub mod coupon;
pub mod location;
pub mod order;

use serde::{Deserialize, Serialize};

pub use account::{UpdateProfileRequest, UserProfile, UserRole};
pub use auth::{AuthResponse, LoginRequest, RefreshResponse, SignupRequest};
pub use catalog::{Category, CategoryInput, Product, ProductInput, ProductQuery};
pub use coupon::{ApplyCouponRequest, Coupon, CouponInput, CouponQuote, DiscountKind};
pub use location::{City, Province, Zone};
pub use order::{CreateOrderRequest, Order, OrderItem, OrderLine, OrderStatus, ShippingAddress};

/// Paginated list envelope returned by list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(alias = "data", alias = "results")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub limit: Option<u32>,
}

fn first_page() -> u32 {
    1
}

/// Acknowledgement body returned by mutating endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
}
