//! Authenticated API client with single-flight credential refresh
//!
//! Every request carries the fixed service header, the cookie jar and the
//! current bearer credential. A first 401 on an ordinary request is absorbed:
//! the client refreshes the credential once (shared by every request that fails
//! while the refresh is running) and replays the request exactly once.

use std::sync::Arc;
use std::time::Duration;

use dropdoko_common::auth::SessionCredential;
use dropdoko_domain::constants::{
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVICE_HEADER, DEFAULT_USER_AGENT, REFRESH_PATH,
};
use dropdoko_domain::{Config, RefreshResponse};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::errors::ApiError;
use super::refresh::{
    RefreshCoordinator, RefreshGuard, RefreshOutcome, RefreshTicket, RefreshTrigger,
};
use super::request::{ApiRequest, ApiResponse};
use super::session::SessionHandle;
use crate::http::HttpClient;

/// Configuration for API client
#[derive(Clone)]
pub struct ApiClientConfig {
    /// Base URL for API (e.g., "https://api.dropdoko.com/api")
    pub base_url: String,
    /// Default timeout for API requests
    pub timeout: Duration,
    /// Name of the fixed service header
    pub service_header: String,
    /// Value of the fixed service header; empty disables the header
    pub service_token: String,
    /// Path of the credential refresh endpoint
    pub refresh_path: String,
    pub user_agent: String,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            service_header: DEFAULT_SERVICE_HEADER.to_string(),
            service_token: String::new(),
            refresh_path: REFRESH_PATH.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&Config> for ApiClientConfig {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            timeout: Duration::from_secs(config.api.request_timeout_secs),
            service_header: config.api.service_header.clone(),
            service_token: config.api.service_token.clone(),
            refresh_path: config.session.endpoints.refresh.clone(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl std::fmt::Debug for ApiClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("service_header", &self.service_header)
            .field("service_token", &"***")
            .field("refresh_path", &self.refresh_path)
            .finish()
    }
}

/// Status and buffered body of any backend response.
struct RawResponse {
    status: StatusCode,
    body: String,
}

/// Authenticated backend client.
///
/// Construct one per session and share it behind an `Arc`; the refresh state
/// is owned by the instance.
pub struct ApiClient {
    http_client: HttpClient,
    config: ApiClientConfig,
    session: Arc<SessionHandle>,
    refresh: RefreshCoordinator,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the service header is not a valid HTTP
    /// header or the HTTP client cannot be built
    pub fn new(config: ApiClientConfig, session: Arc<SessionHandle>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if !config.service_token.is_empty() {
            let name = HeaderName::from_bytes(config.service_header.as_bytes()).map_err(|e| {
                ApiError::Config(format!("Invalid service header name: {}", e))
            })?;
            let mut value = HeaderValue::from_str(&config.service_token)
                .map_err(|e| ApiError::Config(format!("Invalid service token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let http_client = HttpClient::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {}", e)))?;

        Ok(Self { http_client, config, session, refresh: RefreshCoordinator::new() })
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionHandle> {
        &self.session
    }

    /// Whether a credential refresh is currently in flight
    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_in_flight()
    }

    /// Issue a request, recovering once from an expired credential.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Network`] / [`ApiError::Timeout`] when no response arrived
    /// - [`ApiError::Unauthorized`] when the replay after a refresh is rejected
    /// - [`ApiError::SessionTerminated`] when the refresh itself failed
    /// - [`ApiError::Server`] / [`ApiError::Domain`] for other non-2xx statuses
    #[instrument(
        skip(self, request),
        fields(request_id = %Uuid::new_v4(), method = %request.method(), path = %request.path())
    )]
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let since = self.refresh.generation();
        let sent_with = self.session.current();
        let response = self.execute(&request, sent_with.as_ref()).await?;

        if response.status != StatusCode::UNAUTHORIZED {
            return Self::into_result(response);
        }

        if request.is_credential_issuing() {
            debug!("credential-issuing request rejected; no refresh");
            return Self::into_result(response);
        }

        let trigger = if request.is_background() {
            RefreshTrigger::Background
        } else {
            RefreshTrigger::Foreground
        };

        self.recover(trigger, since, sent_with.as_ref()).await?;
        self.replay(&request).await
    }

    /// Execute a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    /// Execute a GET request with query parameters
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T, ApiError> {
        self.send(ApiRequest::get(path).query_pairs(query)).await?.json()
    }

    /// Execute a POST request with a JSON body
    pub async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        self.send(ApiRequest::post(path).json(body)?).await?.json()
    }

    /// Execute a PUT request with a JSON body
    pub async fn put<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        self.send(ApiRequest::put(path).json(body)?).await?.json()
    }

    /// Execute a PATCH request with a JSON body
    pub async fn patch<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        self.send(ApiRequest::patch(path).json(body)?).await?.json()
    }

    /// Execute a DELETE request
    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.send(ApiRequest::delete(path)).await?.json()
    }

    /// Refresh the credential now, or join a refresh that is already running.
    ///
    /// Used by the background scheduler. A failure terminates the session the
    /// same way a failed on-demand refresh does.
    #[instrument(skip(self))]
    pub async fn refresh_now(&self, trigger: RefreshTrigger) -> Result<(), ApiError> {
        let since = self.refresh.generation();
        let current = self.session.current();
        self.recover(trigger, since, current.as_ref()).await
    }

    /// Wait until a credential newer than `sent_with` is current, refreshing
    /// it if nobody else is.
    ///
    /// A follower whose leader went away before settling re-enters the
    /// coordinator, so one of the remaining waiters takes over the refresh.
    async fn recover(
        &self,
        trigger: RefreshTrigger,
        since: u64,
        sent_with: Option<&SessionCredential>,
    ) -> Result<(), ApiError> {
        loop {
            let ticket = self.refresh.begin(trigger, since, || {
                let current = self.session.current();
                current.is_some() && current.as_ref() != sent_with
            });

            let rx = match ticket {
                RefreshTicket::Stale => {
                    debug!("credential replaced while request was in flight; replaying");
                    return Ok(());
                }
                RefreshTicket::Terminated(reason) => {
                    debug!("session terminated while request was in flight");
                    return Err(ApiError::SessionTerminated(reason));
                }
                RefreshTicket::Leader(guard) => return self.lead_refresh(guard, trigger).await,
                RefreshTicket::Follower(rx) => rx,
            };

            match rx.await {
                Ok(RefreshOutcome::Refreshed) => return Ok(()),
                Ok(RefreshOutcome::Failed(reason)) => {
                    return Err(ApiError::SessionTerminated(reason));
                }
                Ok(RefreshOutcome::Abandoned) | Err(_) => {
                    debug!("refresh abandoned by its leader; rejoining");
                }
            }
        }
    }

    async fn replay(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let credential = self.session.current();
        let response = self.execute(request, credential.as_ref()).await?;

        if response.status == StatusCode::UNAUTHORIZED {
            warn!("request rejected again after credential refresh");
            let rejected = ApiError::from_response(response.status.as_u16(), &response.body);
            let message = rejected.backend_message().unwrap_or("unauthorized").to_string();
            return Err(ApiError::Unauthorized(message));
        }

        Self::into_result(response)
    }

    async fn lead_refresh(
        &self,
        guard: RefreshGuard<'_>,
        trigger: RefreshTrigger,
    ) -> Result<(), ApiError> {
        info!(?trigger, "refreshing session credential");

        match self.request_new_credential().await {
            Ok(credential) => {
                if let Err(err) = self.session.replace(credential).await {
                    warn!(error = %err, "refreshed credential could not be persisted");
                }
                let report = guard.settle(RefreshOutcome::Refreshed);
                info!(released = report.drained, "session credential refreshed");
                Ok(())
            }
            Err(err) => {
                let reason = format!("credential refresh failed: {}", err);
                self.session.forget();
                let report = guard.settle(RefreshOutcome::Failed(reason.clone()));
                warn!(rejected = report.drained, error = %err, "credential refresh failed");

                if let Err(clear_err) = self.session.clear().await {
                    warn!(error = %clear_err, "stale credential could not be removed from store");
                }

                if !trigger.is_background() || report.foreground_waiters {
                    self.session.terminate(&reason);
                } else {
                    info!("background refresh failed; session cleared without notification");
                }

                Err(ApiError::SessionTerminated(reason))
            }
        }
    }

    async fn request_new_credential(&self) -> Result<SessionCredential, ApiError> {
        let builder = self.http_client.request(Method::POST, self.url(&self.config.refresh_path));
        let response = self.dispatch(builder, self.config.timeout).await?;

        if !response.status.is_success() {
            return Err(ApiError::from_response(response.status.as_u16(), &response.body));
        }

        let refreshed: RefreshResponse = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::Decode(format!("Failed to parse refresh response: {}", e)))?;

        if refreshed.access_token.trim().is_empty() {
            return Err(ApiError::Decode("refresh response carried an empty access token".into()));
        }

        Ok(SessionCredential::new(refreshed.access_token))
    }

    async fn execute(
        &self,
        request: &ApiRequest,
        credential: Option<&SessionCredential>,
    ) -> Result<RawResponse, ApiError> {
        let mut builder =
            self.http_client.request(request.method().clone(), self.url(request.path()));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(credential) = credential {
            builder = builder.bearer_auth(credential.expose());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        self.dispatch(builder, request.timeout.unwrap_or(self.config.timeout)).await
    }

    async fn dispatch(
        &self,
        builder: RequestBuilder,
        timeout: Duration,
    ) -> Result<RawResponse, ApiError> {
        let exchange = async {
            let response = self.http_client.send(builder).await?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| ApiError::Network(format!("Failed to read response body: {}", e)))?;
            Ok::<_, ApiError>(RawResponse { status, body })
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                warn!(?timeout, "request timed out");
                Err(ApiError::Timeout(timeout))
            }
        }
    }

    fn into_result(response: RawResponse) -> Result<ApiResponse, ApiError> {
        if response.status.is_success() {
            return Ok(ApiResponse::new(response.status.as_u16(), response.body));
        }

        let err = ApiError::from_response(response.status.as_u16(), &response.body);
        debug!(status = response.status.as_u16(), error = %err, "backend rejected request");
        Err(err)
    }

    fn url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiClientConfig>,
    session: Option<Arc<SessionHandle>>,
}

impl ApiClientBuilder {
    /// Set the API configuration
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the session the client reads credentials from
    pub fn session(mut self, session: Arc<SessionHandle>) -> Self {
        self.session = Some(session);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if required fields are missing or client creation fails
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let session =
            self.session.ok_or_else(|| ApiError::Config("Session handle not set".to_string()))?;

        ApiClient::new(config, session)
    }
}

#[cfg(test)]
mod tests {
    use dropdoko_common::testing::MockCredentialStore;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const KEY: &str = "dropdoko.access_token";

    async fn session_with(token: Option<&str>) -> Arc<SessionHandle> {
        let store = match token {
            Some(token) => MockCredentialStore::with_credential(KEY, token),
            None => MockCredentialStore::new(),
        };
        let session = SessionHandle::new(Arc::new(store), KEY);
        session.restore().await.unwrap();
        Arc::new(session)
    }

    async fn client_for(server: &MockServer, token: Option<&str>) -> ApiClient {
        let config = ApiClientConfig {
            base_url: server.uri(),
            service_token: "service-token".to_string(),
            ..Default::default()
        };
        ApiClient::new(config, session_with(token).await).unwrap()
    }

    #[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
    struct TestResponse {
        message: String,
    }

    #[derive(Debug, serde::Serialize)]
    struct TestRequest {
        data: String,
    }

    #[tokio::test]
    async fn test_builder_pattern() {
        let client = ApiClient::builder().session(session_with(None).await).build();
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_builder_missing_session() {
        let result = ApiClient::builder().build();
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[tokio::test]
    async fn test_invalid_service_header_is_config_error() {
        let config = ApiClientConfig {
            service_header: "bad header".to_string(),
            service_token: "token".to_string(),
            ..Default::default()
        };
        let result = ApiClient::new(config, session_with(None).await);
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[tokio::test]
    async fn test_get_attaches_bearer_and_service_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/product/getall"))
            .and(header("Authorization", "Bearer test-token"))
            .and(header("x-api-key", "service-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(TestResponse { message: "success".to_string() }),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Some("test-token")).await;

        let result: TestResponse = client.get("/product/getall").await.unwrap();
        assert_eq!(result.message, "success");
    }

    #[tokio::test]
    async fn test_anonymous_request_has_no_bearer() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/category/getall"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<String>::new()))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, None).await;
        let _: Vec<String> = client.get("/category/getall").await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_get_with_query() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/product/getall"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<String>::new()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Some("test-token")).await;
        let result: Vec<String> = client
            .get_with_query("/product/getall", vec![("page".to_string(), "2".to_string())])
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_get_with_204_no_content() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/coupon/delete/abc"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Some("test-token")).await;

        let result: Result<(), ApiError> = client.delete("/coupon/delete/abc").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_get_with_205_reset_content() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/reset"))
            .respond_with(ResponseTemplate::new(205))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Some("test-token")).await;

        let result: Result<(), ApiError> = client.get("/reset").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_post_with_json_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/create"))
            .and(body_json(serde_json::json!({ "data": "test" })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(TestResponse { message: "created".to_string() }),
            )
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Some("test-token")).await;

        let request = TestRequest { data: "test".to_string() };
        let result: TestResponse = client.post("/create", &request).await.unwrap();
        assert_eq!(result.message, "created");
    }

    #[tokio::test]
    async fn test_500_is_server_error_without_retry() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/error"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({ "message": "database offline" })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Some("test-token")).await;

        let err = client.get::<TestResponse>("/error").await.unwrap_err();
        match err {
            ApiError::Server { status, message, payload } => {
                assert_eq!(status, 500);
                assert_eq!(message, "database offline");
                assert!(payload.is_some());
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_404_is_domain_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/notfound"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Some("test-token")).await;

        let err = client.get::<TestResponse>("/notfound").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.backend_message(), Some("Not found"));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_decode_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Some("test-token")).await;

        let err = client.get::<TestResponse>("/html").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_per_request_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Some("test-token")).await;

        let err = client
            .send(ApiRequest::get("/slow").timeout(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Timeout(_)));
        assert!(!client.is_refreshing());
    }

    #[tokio::test]
    async fn test_refresh_replays_request_with_new_credential() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/order/myorders"))
            .and(header("Authorization", "Bearer old-token"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "accessToken": "new-token" })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/order/myorders"))
            .and(header("Authorization", "Bearer new-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<String>::new()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Some("old-token")).await;

        let orders: Vec<String> = client.get("/order/myorders").await.unwrap();
        assert!(orders.is_empty());
        assert_eq!(client.session().current().unwrap().expose(), "new-token");
        assert!(!client.is_refreshing());
    }
}
