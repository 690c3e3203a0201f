use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::Value;

use crate::{config::Config, error::TransportError, management::ApiClientHandle};

/// A single call against the resource API, relative to its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ResourceRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Capability to fetch raw JSON resources from the Web API.
///
/// The typed client only depends on this trait, which keeps token handling
/// out of the resource layer and lets tests substitute canned responses.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch_resource(&self, request: ResourceRequest) -> Result<Value, TransportError>;
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// [`ResourceFetcher`] backed by reqwest and a bearer token.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
    base_url: String,
    handle: ApiClientHandle,
}

impl HttpFetcher {
    pub fn new(config: &Config, handle: ApiClientHandle) -> Result<Self, TransportError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            handle,
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{base}/{path}",
            base = self.base_url.trim_end_matches('/'),
            path = path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch_resource(&self, request: ResourceRequest) -> Result<Value, TransportError> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.url(&request.path))
            .bearer_auth(self.handle.access_token())
            .query(&request.query);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(method = %request.method, path = %request.path, "fetching resource");
        let res = builder.send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(TransportError::Status { status, message });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}
