//! Coupon types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a coupon's `value` is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

/// Coupon as managed in the back-office
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[serde(alias = "_id")]
    pub id: String,
    pub code: String,
    pub discount_type: DiscountKind,
    pub value: f64,
    #[serde(default)]
    pub min_order_amount: Option<f64>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Coupon create/update body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponInput {
    pub code: String,
    pub discount_type: DiscountKind,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_order_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
}

/// Checkout-time coupon check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCouponRequest {
    pub code: String,
    pub order_amount: f64,
}

/// Discount the backend grants for an applied coupon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponQuote {
    pub code: String,
    pub discount: f64,
    pub final_amount: f64,
}
