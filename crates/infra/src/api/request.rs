//! Request and response values exchanged with [`ApiClient::send`].
//!
//! [`ApiClient::send`]: super::client::ApiClient::send

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::errors::ApiError;

/// A backend call described independently of the transport.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<Value>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) credential_issuing: bool,
    pub(crate) background: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            timeout: None,
            credential_issuing: false,
            background: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Attach a JSON body.
    ///
    /// The body is serialized eagerly so the request can be replayed after a
    /// credential refresh.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Config(format!("Failed to serialize body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Override the client's default timeout for this request only.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Mark the request as one that issues credentials (login, signup).
    ///
    /// A 401 on such a request means bad credentials, not an expired session,
    /// so it is returned as [`ApiError::Domain`] and never triggers a refresh.
    pub fn credential_issuing(mut self) -> Self {
        self.credential_issuing = true;
        self
    }

    /// Mark the request as best-effort. A failed refresh started on its behalf
    /// does not notify the session termination handler.
    pub fn background(mut self) -> Self {
        self.background = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_credential_issuing(&self) -> bool {
        self.credential_issuing
    }

    pub fn is_background(&self) -> bool {
        self.background
    }
}

/// A successful (2xx) backend response with its body buffered.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    body: String,
}

impl ApiResponse {
    pub(crate) fn new(status: u16, body: String) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn into_text(self) -> String {
        self.body
    }

    /// Decode the body as JSON.
    ///
    /// An empty body (204/205 or a bodiless 200) decodes from `null`, so
    /// `()` and `Option<T>` targets succeed.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        if self.body.trim().is_empty() {
            return serde_json::from_value(Value::Null).map_err(|_| {
                ApiError::Decode(format!(
                    "No content response ({}), but response type cannot be deserialized from empty body",
                    self.status
                ))
            });
        }

        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::Decode(format!("Failed to parse response: {}", e)))
    }
}
