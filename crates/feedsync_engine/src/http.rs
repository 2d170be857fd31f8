//! HTTP remote implementation.
//!
//! This module maps the [`RemoteFeed`] operations onto the feed service's
//! REST routes with JSON bodies. The actual HTTP client is abstracted via a
//! trait to allow different implementations (reqwest, hyper, etc.).

use crate::config::HttpRemoteConfig;
use crate::error::Fault;
use crate::remote::{RemoteFeed, RemoteResult};
use async_trait::async_trait;
use feedsync_protocol::{from_json, to_json, ApiResponse, FeedItem, ItemId};
use serde::de::DeserializeOwned;
use std::io;
use tracing::debug;

/// HTTP method used by the feed routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`.
    Get,
    /// `POST`.
    Post,
    /// `DELETE`.
    Delete,
}

/// An outgoing HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// JSON body, if any.
    pub body: Option<Vec<u8>>,
}

/// A received HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Reason phrase.
    pub reason: String,
    /// Raw body.
    pub body: Vec<u8>,
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. Transport
/// failures (DNS, refused connections, resets) must be reported as
/// `io::Error`; any status code, including 4xx/5xx, is a response.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response.
    async fn send(&self, request: HttpRequest) -> io::Result<HttpResponse>;
}

/// HTTP-backed remote feed.
pub struct HttpRemote<C: HttpClient> {
    config: HttpRemoteConfig,
    client: C,
}

impl<C: HttpClient> HttpRemote<C> {
    /// Creates a new HTTP remote.
    pub fn new(config: HttpRemoteConfig, client: C) -> Self {
        Self { config, client }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<HttpResponse, Fault> {
        let request = HttpRequest {
            method,
            url: self.url(path),
            body,
        };
        debug!(?method, url = %request.url, "sending request");

        let response = tokio::time::timeout(self.config.timeout, self.client.send(request))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "request timed out"))??;

        debug!(status = response.status, "received response");
        Ok(response)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> RemoteResult<T> {
        let response = self.send(method, path, body).await?;
        decode(response)
    }
}

/// Decodes a response. Only successful responses carry a decoded body.
fn decode<T: DeserializeOwned>(response: HttpResponse) -> RemoteResult<T> {
    let mut decoded = ApiResponse::status(response.status, response.reason);
    if decoded.is_success() && !response.body.is_empty() {
        decoded.body = Some(from_json(&response.body)?);
    }
    Ok(decoded)
}

#[async_trait]
impl<C: HttpClient> RemoteFeed for HttpRemote<C> {
    async fn fetch_all(&self) -> RemoteResult<Vec<FeedItem>> {
        self.call(Method::Get, "posts", None).await
    }

    async fn fetch_newer_than(&self, id: ItemId) -> RemoteResult<Vec<FeedItem>> {
        self.call(Method::Get, &format!("posts/{id}/newer"), None)
            .await
    }

    async fn save(&self, item: &FeedItem) -> RemoteResult<FeedItem> {
        let body = to_json(item)?;
        self.call(Method::Post, "posts", Some(body)).await
    }

    async fn delete_by_id(&self, id: ItemId) -> RemoteResult<()> {
        let response = self
            .send(Method::Delete, &format!("posts/{id}"), None)
            .await?;
        let mut decoded = ApiResponse::status(response.status, response.reason);
        if decoded.is_success() {
            decoded.body = Some(());
        }
        Ok(decoded)
    }

    async fn like(&self, id: ItemId) -> RemoteResult<FeedItem> {
        self.call(Method::Post, &format!("posts/{id}/likes"), None)
            .await
    }

    async fn unlike(&self, id: ItemId) -> RemoteResult<FeedItem> {
        self.call(Method::Delete, &format!("posts/{id}/likes"), None)
            .await
    }
}
