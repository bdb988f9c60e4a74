//! Back-office API commands
//!
//! Product, category, order, coupon and customer management. The backend
//! enforces the admin role; a customer credential gets a 403 back as
//! [`ApiError::Domain`].

use std::sync::Arc;

use dropdoko_domain::{
    Category, CategoryInput, Coupon, CouponInput, MessageResponse, Order, OrderStatus, Page,
    Product, ProductInput, UserProfile,
};
use serde::Serialize;
use tracing::{info, instrument};
use urlencoding::encode;

use super::client::ApiClient;
use super::errors::ApiError;
use super::request::ApiRequest;

#[derive(Debug, Serialize)]
struct UpdateOrderStatusRequest<'a> {
    status: &'a OrderStatus,
}

/// Back-office commands
pub struct AdminCommands {
    client: Arc<ApiClient>,
}

impl AdminCommands {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    // === Products ===

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, ApiError> {
        let product: Product = self.client.post("/product/create", input).await?;
        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update_product(&self, id: &str, input: &ProductInput) -> Result<Product, ApiError> {
        let path = format!("/product/update/{}", encode(id));
        self.client.put(&path, input).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &str) -> Result<MessageResponse, ApiError> {
        let path = format!("/product/delete/{}", encode(id));
        self.client.delete(&path).await
    }

    // === Categories ===

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_category(&self, input: &CategoryInput) -> Result<Category, ApiError> {
        self.client.post("/category/create", input).await
    }

    #[instrument(skip(self, input), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        id: &str,
        input: &CategoryInput,
    ) -> Result<Category, ApiError> {
        let path = format!("/category/update/{}", encode(id));
        self.client.put(&path, input).await
    }

    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete_category(&self, id: &str) -> Result<MessageResponse, ApiError> {
        let path = format!("/category/delete/{}", encode(id));
        self.client.delete(&path).await
    }

    // === Orders ===

    /// List every order, newest first, optionally filtered by status
    ///
    /// # Arguments
    ///
    /// * `page` - 1-based page number
    /// * `limit` - page size
    /// * `status` - only return orders in this status
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u32,
        limit: u32,
        status: Option<&OrderStatus>,
    ) -> Result<Page<Order>, ApiError> {
        let mut request = ApiRequest::get("/order/getall").query("page", page).query("limit", limit);
        if let Some(status) = status {
            request = request.query("status", status.as_str());
        }

        self.client.send(request).await?.json()
    }

    /// Move an order to `status`. Transition rules are the backend's.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        id: &str,
        status: &OrderStatus,
    ) -> Result<Order, ApiError> {
        let path = format!("/order/updatestatus/{}", encode(id));
        let order: Order = self.client.patch(&path, &UpdateOrderStatusRequest { status }).await?;

        info!(order_id = %order.id, status = %order.status, "Order status updated");
        Ok(order)
    }

    // === Coupons ===

    #[instrument(skip(self))]
    pub async fn list_coupons(&self) -> Result<Vec<Coupon>, ApiError> {
        self.client.get("/coupon/getall").await
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_coupon(&self, input: &CouponInput) -> Result<Coupon, ApiError> {
        self.client.post("/coupon/create", input).await
    }

    #[instrument(skip(self, input), fields(coupon_id = %id))]
    pub async fn update_coupon(&self, id: &str, input: &CouponInput) -> Result<Coupon, ApiError> {
        let path = format!("/coupon/update/{}", encode(id));
        self.client.put(&path, input).await
    }

    #[instrument(skip(self), fields(coupon_id = %id))]
    pub async fn delete_coupon(&self, id: &str) -> Result<MessageResponse, ApiError> {
        let path = format!("/coupon/delete/{}", encode(id));
        self.client.delete(&path).await
    }

    // === Customers ===

    #[instrument(skip(self))]
    pub async fn list_customers(&self, page: u32, limit: u32) -> Result<Page<UserProfile>, ApiError> {
        let request = ApiRequest::get("/user/getall").query("page", page).query("limit", limit);
        self.client.send(request).await?.json()
    }

    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn get_customer(&self, id: &str) -> Result<UserProfile, ApiError> {
        let path = format!("/user/getbyid/{}", encode(id));
        self.client.get(&path).await
    }
}
