//! The HTTP transport seam the retry and OAuth2-retry layers wrap.
//!
//! `Transport` is kept dyn-compatible by returning a boxed future by hand
//! rather than via `async fn` in the trait, so the orchestrator can compose
//! `ReqwestTransport` with zero, one, or two wrapping layers behind a single
//! `Box<dyn Transport>` depending on which auth/retry combination spec §4.6
//! selects.

use crate::error::SiphonError;
use crate::request::PendingRequest;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A raw HTTP response: status, headers, and the body buffered exactly
/// once into memory (spec §3 "HTTP exchange" invariant).
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes a [`PendingRequest`] and returns the buffered response.
pub trait Transport: Send + Sync {
    fn send<'a>(&'a self, req: &'a PendingRequest) -> BoxFuture<'a, Result<RawResponse, SiphonError>>;
}

/// The base transport: a thin `reqwest::Client` wrapper.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl Transport for Box<dyn Transport> {
    fn send<'a>(&'a self, req: &'a PendingRequest) -> BoxFuture<'a, Result<RawResponse, SiphonError>> {
        (**self).send(req)
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(&'a self, req: &'a PendingRequest) -> BoxFuture<'a, Result<RawResponse, SiphonError>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(req.method.clone(), req.url.clone())
                .headers(req.headers.clone());
            if let Some(body) = &req.body {
                builder = builder.json(body);
            }
            let response = builder
                .send()
                .await
                .map_err(|e| SiphonError::HttpRequest { source: e })?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response
                .bytes()
                .await
                .map_err(|e| SiphonError::HttpRequest { source: e })?;
            Ok(RawResponse { status, headers, body })
        })
    }
}
