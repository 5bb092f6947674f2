//! Request descriptors for the intercepted API pipeline.

use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use super::error::ApiError;

/// Join a relative endpoint path onto a base URL ending in `/`
pub(crate) fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url, path.trim_start_matches('/'))
}

/// A request to the remote API, described independently of any credential
/// so it can be rebuilt and resubmitted after a token refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post<B: Serialize + ?Sized>(path: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        Self::new(Method::POST, path).with_json(body)
    }

    pub fn patch<B: Serialize + ?Sized>(path: impl Into<String>, body: &B) -> Result<Self, ApiError> {
        Self::new(Method::PATCH, path).with_json(body)
    }

    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Build an unauthenticated reqwest request for this descriptor
    pub fn build(&self, client: &Client, base_url: &str) -> RequestBuilder {
        let builder = client.request(self.method.clone(), endpoint_url(base_url, &self.path));
        match self.body {
            Some(ref body) => builder.json(body),
            None => builder,
        }
    }
}

/// Pairs a request with its "already retried" marker.
///
/// The marker bounds the refresh-and-retry protocol to one attempt per
/// originating request; it is never shared between requests.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryableRequest {
    request: ApiRequest,
    retried: bool,
}

impl RetryableRequest {
    pub fn new(request: ApiRequest) -> Self {
        Self {
            request,
            retried: false,
        }
    }

    pub fn request(&self) -> &ApiRequest {
        &self.request
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    /// Consume the request and return it flagged as retried
    pub fn mark_retried(self) -> Self {
        Self {
            retried: true,
            ..self
        }
    }
}

impl From<ApiRequest> for RetryableRequest {
    fn from(request: ApiRequest) -> Self {
        Self::new(request)
    }
}
