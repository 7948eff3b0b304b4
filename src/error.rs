//! Error taxonomy surfaced by the extraction engine.
//!
//! Every variant preserves its cause chain via `#[source]` so callers can
//! walk the full context of a failure rather than only seeing the outermost
//! message.

use crate::boxed::BoxedStr;
use thiserror::Error;

/// Errors returned by the extraction engine.
#[derive(Error, Debug)]
#[allow(clippy::module_name_repetitions, reason = "exported at crate root")]
pub enum SiphonError {
    /// Validator rejected a pipeline configuration, or a request named an
    /// unknown source/pagination/auth kind.
    #[error("configuration error: {0}")]
    Configuration(Box<str>),

    /// Credential application failed for non-token reasons (e.g. a missing
    /// required field for a configured auth handler).
    #[error("authentication error: {0}")]
    Authentication(Box<str>),

    /// OAuth2 token refresh failed after the cached token had already
    /// expired.
    #[error("token expired and refresh failed: {0}")]
    TokenExpired(Box<str>),

    /// Request construction or transport-level failure.
    #[error("http request failed: {source}")]
    HttpRequest {
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx status on the non-paginating path, or a body read/decode
    /// failure.
    #[error("http response error (status {status}): {message}")]
    HttpResponse { status: u16, message: Box<str> },

    /// Pager state update failed, a 429 was observed mid-pagination, or a
    /// next-link could not be resolved.
    #[error("pagination error: {0}")]
    Pagination(Box<str>),

    /// Root path not found, not an array, or an item was not a mapping.
    #[error("extraction error: {0}")]
    Extraction(Box<str>),

    /// The response contained a top-level, non-empty `errors` array.
    #[error("graphql errors: {0}")]
    GraphQl(Box<str>),

    /// Reserved for external validators layered on top of this crate.
    #[error("validation error: {0}")]
    Validation(Box<str>),

    /// The caller's cancellation handle fired.
    #[error("extraction cancelled")]
    Cancelled,
}

impl SiphonError {
    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into().boxed())
    }

    pub(crate) fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into().boxed())
    }

    pub(crate) fn pagination(msg: impl Into<String>) -> Self {
        Self::Pagination(msg.into().boxed())
    }

    pub(crate) fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into().boxed())
    }

    pub(crate) fn http_response(status: u16, msg: impl Into<String>) -> Self {
        Self::HttpResponse {
            status,
            message: msg.into().boxed(),
        }
    }

    pub(crate) fn graphql(msg: impl Into<String>) -> Self {
        Self::GraphQl(msg.into().boxed())
    }
}
