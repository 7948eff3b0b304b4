//! Transport wrapper that retries once on a 401 after invalidating the
//! cached OAuth2 token (spec §4.2's "transparent 401-retry").
//!
//! The retry is scoped to a single [`Transport::send`] call: each call
//! applies auth fresh, and a 401 triggers exactly one re-application and
//! re-send. There is no cross-call retry bookkeeping to leak or expire.

use super::AuthHandler;
use crate::error::SiphonError;
use crate::request::PendingRequest;
use crate::transport::{BoxFuture, RawResponse, Transport};

/// An [`AuthHandler`] that can invalidate its cached credential, forcing
/// the next [`AuthHandler::apply`] to refresh. Implemented by
/// [`super::oauth2::OAuth2Auth`]; kept as a separate trait so this module
/// can be exercised with a test double that never touches the network.
pub trait RefreshableAuth: AuthHandler {
    fn invalidate(&self) -> BoxFuture<'_, ()>;
}

pub struct OAuth2RetryTransport<T, A> {
    inner: T,
    auth: A,
}

impl<T: Transport, A: RefreshableAuth> OAuth2RetryTransport<T, A> {
    #[must_use]
    pub fn new(inner: T, auth: A) -> Self {
        Self { inner, auth }
    }
}

impl<T: Transport, A: RefreshableAuth> Transport for OAuth2RetryTransport<T, A> {
    fn send<'a>(&'a self, req: &'a PendingRequest) -> BoxFuture<'a, Result<RawResponse, SiphonError>> {
        Box::pin(async move {
            let mut first = req.clone();
            self.auth.apply(&mut first).await?;
            let response = self.inner.send(&first).await?;
            if response.status != 401 {
                return Ok(response);
            }

            self.auth.invalidate().await;
            let mut retried = req.clone();
            self.auth.apply(&mut retried).await?;
            self.inner.send(&retried).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use reqwest::header::AUTHORIZATION;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use url::Url;

    struct StubAuth {
        token: AtomicUsize,
        invalidated: AtomicBool,
    }

    impl AuthHandler for StubAuth {
        fn apply<'a>(&'a self, req: &'a mut PendingRequest) -> BoxFuture<'a, Result<(), SiphonError>> {
            Box::pin(async move {
                let generation = self.token.load(Ordering::SeqCst);
                req.set_header(AUTHORIZATION, &format!("Bearer gen-{generation}"))
            })
        }
    }

    impl RefreshableAuth for StubAuth {
        fn invalidate(&self) -> BoxFuture<'_, ()> {
            Box::pin(async move {
                self.invalidated.store(true, Ordering::SeqCst);
                self.token.fetch_add(1, Ordering::SeqCst);
            })
        }
    }

    struct FlakyTransport {
        calls: AtomicUsize,
    }

    impl Transport for FlakyTransport {
        fn send<'a>(&'a self, req: &'a PendingRequest) -> BoxFuture<'a, Result<RawResponse, SiphonError>> {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst);
            let auth_header = req
                .headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Box::pin(async move {
                let status = if idx == 0 { 401 } else { 200 };
                Ok(RawResponse {
                    status,
                    headers: {
                        let mut h = reqwest::header::HeaderMap::new();
                        h.insert("x-seen-auth", auth_header.parse().expect("header value"));
                        h
                    },
                    body: bytes::Bytes::from_static(b"{}"),
                })
            })
        }
    }

    fn req() -> PendingRequest {
        PendingRequest::new(Method::GET, Url::parse("https://api.example.com/x").expect("url"))
    }

    #[tokio::test]
    async fn retries_once_with_refreshed_token_after_401() {
        let auth = StubAuth { token: AtomicUsize::new(0), invalidated: AtomicBool::new(false) };
        let transport = OAuth2RetryTransport::new(FlakyTransport { calls: AtomicUsize::new(0) }, auth);
        let response = transport.send(&req()).await.expect("eventual success");
        assert_eq!(response.status, 200);
        assert!(transport.auth.invalidated.load(Ordering::SeqCst));
        assert_eq!(
            response.headers.get("x-seen-auth").and_then(|v| v.to_str().ok()),
            Some("Bearer gen-1")
        );
    }

    #[tokio::test]
    async fn non_401_response_passes_through_without_invalidating() {
        struct AlwaysOk;
        impl Transport for AlwaysOk {
            fn send<'a>(&'a self, _req: &'a PendingRequest) -> BoxFuture<'a, Result<RawResponse, SiphonError>> {
                Box::pin(async move {
                    Ok(RawResponse { status: 200, headers: Default::default(), body: bytes::Bytes::from_static(b"{}") })
                })
            }
        }
        let auth = StubAuth { token: AtomicUsize::new(0), invalidated: AtomicBool::new(false) };
        let transport = OAuth2RetryTransport::new(AlwaysOk, auth);
        let response = transport.send(&req()).await.expect("ok");
        assert_eq!(response.status, 200);
        assert!(!transport.auth.invalidated.load(Ordering::SeqCst));
    }
}
