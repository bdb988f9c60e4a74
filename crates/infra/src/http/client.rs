use std::time::Duration;

use dropdoko_domain::constants::DEFAULT_USER_AGENT;
use dropdoko_domain::DropDokoError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

/// Thin HTTP transport shared by the API client.
///
/// Every request is attempted exactly once. Retrying is a decision for the
/// layer above, which only ever replays a request after a credential refresh.
/// The cookie jar is enabled by default because the backend keeps its refresh
/// artifact in a cookie.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, DropDokoError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder once.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, DropDokoError> {
        let request = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            DropDokoError::from(infra)
        })?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, path = url.path(), "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, path = url.path(), status = %response.status(), "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, path = url.path(), error = %err, "HTTP request failed");
                let infra: InfraError = err.into();
                Err(DropDokoError::from(infra))
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Option<Duration>,
    user_agent: String,
    default_headers: Option<reqwest::header::HeaderMap>,
    cookie_store: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_headers: None,
            cookie_store: true,
        }
    }
}

impl HttpClientBuilder {
    /// Transport-level ceiling. Unset by default; the API client applies its
    /// own per-request timeout instead.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn cookie_store(mut self, enabled: bool) -> Self {
        self.cookie_store = enabled;
        self
    }

    pub fn build(self) -> Result<HttpClient, DropDokoError> {
        let mut builder = ReqwestClient::builder()
            .user_agent(self.user_agent)
            .cookie_store(self.cookie_store)
            .no_proxy();

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            DropDokoError::from(infra)
        })?;

        Ok(HttpClient { client })
    }
}
