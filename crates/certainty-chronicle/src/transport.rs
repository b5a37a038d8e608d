//! HTTP transport abstraction
//!
//! Both the Chronicle client and the catalog synchronization only ever issue
//! GET requests. [`Transport`] captures that so the network can be swapped
//! for an in-memory mirror.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{Error, Result};

/// A fully buffered HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Response headers in arrival order
    pub headers: Vec<(String, String)>,
    /// Raw body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A 200 response with the given body and no headers
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// A 404 response
    pub fn not_found() -> Self {
        Self {
            status: 404,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// All values of a header, matched case-insensitively
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Fail with [`Error::Api`] unless the status is 2xx
    pub fn error_for_status(self, what: &str) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Api(format!("failed to get {}: {}", what, self.status)))
        }
    }
}

/// Trait for GET-only HTTP transports
pub trait Transport: Send + Sync {
    /// Fetch a URL
    ///
    /// Non-success statuses are returned as responses, not errors; only
    /// connection-level failures are `Err`.
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>> {
        (**self).get(url)
    }
}

/// Transport backed by a `reqwest` client
///
/// The client is supplied by the caller, so TLS policy lives with whoever
/// builds it.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Wrap a configured client
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| Error::Http(e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response
                .bytes()
                .await
                .map_err(|e| Error::Http(e.to_string()))?
                .to_vec();

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        })
    }
}

/// In-memory transport serving canned responses
///
/// Unknown URLs answer 404. Every request is recorded, which makes it
/// possible to assert how many downloads a synchronization performed.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    responses: Arc<RwLock<HashMap<String, HttpResponse>>>,
    requests: Arc<RwLock<Vec<String>>>,
}

impl MemoryTransport {
    /// Create an empty transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for `url`
    pub async fn insert(&self, url: impl Into<String>, response: HttpResponse) {
        self.responses.write().await.insert(url.into(), response);
    }

    /// Stop serving `url`
    pub async fn remove(&self, url: &str) {
        self.responses.write().await.remove(url);
    }

    /// URLs requested so far, in order
    pub async fn requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }

    /// Forget the request log
    pub async fn clear_requests(&self) {
        self.requests.write().await.clear();
    }
}

impl Transport for MemoryTransport {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>> {
        Box::pin(async move {
            self.requests.write().await.push(url.to_string());
            Ok(self
                .responses
                .read()
                .await
                .get(url)
                .cloned()
                .unwrap_or_else(HttpResponse::not_found))
        })
    }
}
