//! Storefront API commands
//!
//! Typed wrappers over [`ApiClient`] for catalog browsing, checkout, order
//! tracking, coupons, profile management and delivery locations.

use std::sync::Arc;

use dropdoko_domain::{
    ApplyCouponRequest, Category, City, CouponQuote, CreateOrderRequest, Order, Page, Product,
    ProductQuery, Province, UpdateProfileRequest, UserProfile, Zone,
};
use tracing::{debug, instrument};
use urlencoding::encode;

use super::client::ApiClient;
use super::errors::ApiError;

/// Storefront commands
pub struct StoreCommands {
    client: Arc<ApiClient>,
}

impl StoreCommands {
    /// Create a new commands instance
    ///
    /// # Arguments
    ///
    /// * `client` - API client
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    // === Catalog ===

    /// List products matching `query`
    ///
    /// # Errors
    ///
    /// Returns error if API request fails
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        let page: Page<Product> =
            self.client.get_with_query("/product/getall", query.to_pairs()).await?;

        debug!(count = page.items.len(), total = page.total, "Products listed");
        Ok(page)
    }

    /// Get a product by ID
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Domain`] with status 404 if the product does not exist
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &str) -> Result<Product, ApiError> {
        let path = format!("/product/getbyid/{}", encode(id));
        self.client.get(&path).await
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.client.get("/category/getall").await
    }

    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn category_products(&self, id: &str) -> Result<Vec<Product>, ApiError> {
        let path = format!("/category/products/{}", encode(id));
        self.client.get(&path).await
    }

    // === Orders ===

    /// Place an order
    ///
    /// # Errors
    ///
    /// Stock or coupon problems come back as [`ApiError::Domain`] with the
    /// backend's message
    #[instrument(skip(self, request), fields(lines = request.items.len()))]
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, ApiError> {
        let order: Order = self.client.post("/order/create", request).await?;

        debug!(order_id = %order.id, "Order created");
        Ok(order)
    }

    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &str) -> Result<Order, ApiError> {
        let path = format!("/order/getbyid/{}", encode(id));
        self.client.get(&path).await
    }

    /// Orders placed by the signed-in customer
    #[instrument(skip(self))]
    pub async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.client.get("/order/myorders").await
    }

    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel_my_order(&self, id: &str) -> Result<Order, ApiError> {
        let path = format!("/order/cancel/{}", encode(id));
        self.client.patch(&path, &serde_json::json!({})).await
    }

    // === Coupons ===

    /// Price a coupon against an order amount
    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn apply_coupon(&self, request: &ApplyCouponRequest) -> Result<CouponQuote, ApiError> {
        self.client.post("/coupon/apply", request).await
    }

    // === Profile ===

    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.client.get("/user/profile").await
    }

    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        request: &UpdateProfileRequest,
    ) -> Result<UserProfile, ApiError> {
        self.client.put("/user/update", request).await
    }

    // === Delivery locations ===

    #[instrument(skip(self))]
    pub async fn provinces(&self) -> Result<Vec<Province>, ApiError> {
        self.client.get("/address/provinces").await
    }

    #[instrument(skip(self), fields(province_id = %province_id))]
    pub async fn cities(&self, province_id: &str) -> Result<Vec<City>, ApiError> {
        let path = format!("/address/cities/{}", encode(province_id));
        self.client.get(&path).await
    }

    #[instrument(skip(self), fields(city_id = %city_id))]
    pub async fn zones(&self, city_id: &str) -> Result<Vec<Zone>, ApiError> {
        let path = format!("/address/zones/{}", encode(city_id));
        self.client.get(&path).await
    }
}

#[cfg(test)]
mod tests {
    use dropdoko_common::testing::MockCredentialStore;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::client::ApiClientConfig;
    use crate::api::session::SessionHandle;

    async fn commands(server: &MockServer) -> StoreCommands {
        let store = MockCredentialStore::with_credential("key", "test-token");
        let session = SessionHandle::new(Arc::new(store), "key");
        session.restore().await.unwrap();
        let config = ApiClientConfig { base_url: server.uri(), ..Default::default() };
        StoreCommands::new(Arc::new(ApiClient::new(config, Arc::new(session)).unwrap()))
    }

    #[tokio::test]
    async fn test_list_products_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/product/getall"))
            .and(query_param("search", "saree"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "_id": "p1", "name": "Silk Saree", "price": 2500.0 }],
                "total": 11,
                "page": 2
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = ProductQuery {
            search: Some("saree".into()),
            page: Some(2),
            ..Default::default()
        };
        let page = commands(&server).await.list_products(&query).await.unwrap();

        assert_eq!(page.total, 11);
        assert_eq!(page.items[0].id, "p1");
    }

    #[tokio::test]
    async fn test_get_product_encodes_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/product/getbyid/a%2Fb"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "_id": "a/b", "name": "Kurta", "price": 900.0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let product = commands(&server).await.get_product("a/b").await.unwrap();
        assert_eq!(product.name, "Kurta");
    }

    #[tokio::test]
    async fn test_apply_coupon_domain_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/coupon/apply"))
            .and(body_json(serde_json::json!({ "code": "OLD10", "orderAmount": 1200.0 })))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({ "message": "Coupon expired" })),
            )
            .mount(&server)
            .await;

        let err = commands(&server)
            .await
            .apply_coupon(&ApplyCouponRequest { code: "OLD10".into(), order_amount: 1200.0 })
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert_eq!(err.backend_message(), Some("Coupon expired"));
    }

    #[tokio::test]
    async fn test_zones_for_city() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/address/zones/ktm"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "_id": "z1", "name": "Baneshwor", "deliveryCharge": 100.0 }
            ])))
            .mount(&server)
            .await;

        let zones = commands(&server).await.zones("ktm").await.unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].delivery_charge, Some(100.0));
    }
}
