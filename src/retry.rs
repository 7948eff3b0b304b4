//! Bounded exponential-backoff retry transport (spec §4.4).
//!
//! Only idempotent methods are retried; other methods pass straight
//! through to the wrapped transport. Retries use "full jitter": the wait
//! before attempt N is sampled uniformly from `[0, initial * multiplier^N)`,
//! capped at 30 seconds.

use crate::error::SiphonError;
use crate::request::PendingRequest;
use crate::transport::{BoxFuture, RawResponse, Transport};
use rand::Rng;
use reqwest::Method;
use std::collections::HashSet;
use std::time::Duration;
use tracing::warn;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS | Method::TRACE
    )
}

fn is_retryable_network_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Configuration for [`RetryTransport`], mirroring spec §6's `retry_config`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub backoff_multiplier: f64,
    pub retryable_statuses: HashSet<u16>,
}

impl From<&crate::config::RetryConfigSpec> for RetryPolicy {
    fn from(spec: &crate::config::RetryConfigSpec) -> Self {
        Self {
            max_attempts: spec.max_attempts,
            initial_backoff: Duration::from_secs_f64(spec.initial_backoff_secs),
            backoff_multiplier: spec.backoff_multiplier,
            retryable_statuses: spec.retryable_statuses.iter().copied().collect(),
        }
    }
}

/// Wraps a [`Transport`] with bounded exponential-backoff retry of
/// idempotent requests.
pub struct RetryTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: Transport> RetryTransport<T> {
    #[must_use]
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let factor = self.policy.backoff_multiplier.powi(i32::try_from(attempt).unwrap_or(i32::MAX));
        let ceiling = self.policy.initial_backoff.mul_f64(factor);
        ceiling.min(MAX_BACKOFF)
    }

    async fn jittered_sleep(&self, attempt: u32) {
        let ceiling = self.backoff_ceiling(attempt);
        if ceiling.is_zero() {
            return;
        }
        let nanos = ceiling.as_nanos().min(u128::from(u64::MAX));
        let sampled = rand::thread_rng().gen_range(0..=nanos as u64);
        tokio::time::sleep(Duration::from_nanos(sampled)).await;
    }
}

impl<T: Transport> Transport for RetryTransport<T> {
    fn send<'a>(&'a self, req: &'a PendingRequest) -> BoxFuture<'a, Result<RawResponse, SiphonError>> {
        Box::pin(async move {
            if !is_idempotent(&req.method) {
                return self.inner.send(req).await;
            }

            let mut last_response: Option<RawResponse> = None;
            let mut last_error: Option<SiphonError> = None;

            for attempt in 0..self.policy.max_attempts {
                if attempt > 0 {
                    self.jittered_sleep(attempt).await;
                }
                match self.inner.send(req).await {
                    Ok(resp) if resp.is_success() => return Ok(resp),
                    Ok(resp) if self.policy.retryable_statuses.contains(&resp.status) => {
                        warn!(status = resp.status, attempt, "retrying after retryable status");
                        last_response = Some(resp);
                        last_error = None;
                    }
                    Ok(resp) => {
                        return Err(SiphonError::http_response(
                            resp.status,
                            format!("non-retryable status {}", resp.status),
                        ));
                    }
                    Err(SiphonError::HttpRequest { source }) if is_retryable_network_error(&source) => {
                        warn!(attempt, error = %source, "retrying after transient network error");
                        last_error = Some(SiphonError::HttpRequest { source });
                        last_response = None;
                    }
                    Err(other) => return Err(other),
                }
            }

            match (last_response, last_error) {
                (Some(resp), _) => Ok(resp),
                (None, Some(err)) => Err(SiphonError::configuration(format!(
                    "exhausted {} retry attempts: {err}",
                    self.policy.max_attempts
                ))),
                (None, None) => Err(SiphonError::configuration("retry transport produced no result")),
            }
        })
    }
}
