//! API key authentication (spec §4.2): sets a header and/or query
//! parameter with a fixed value.

use super::AuthHandler;
use crate::error::SiphonError;
use crate::request::PendingRequest;
use crate::transport::BoxFuture;
use reqwest::header::HeaderName;

pub struct ApiKeyAuth {
    value: String,
    header: Option<String>,
    query_param: Option<String>,
}

impl ApiKeyAuth {
    #[must_use]
    pub fn new(value: String, header: Option<String>, query_param: Option<String>) -> Self {
        Self { value, header, query_param }
    }
}

impl AuthHandler for ApiKeyAuth {
    fn apply<'a>(&'a self, req: &'a mut PendingRequest) -> BoxFuture<'a, Result<(), SiphonError>> {
        Box::pin(async move {
            if let Some(header) = &self.header {
                let name = HeaderName::from_bytes(header.as_bytes())
                    .map_err(|e| SiphonError::authentication(format!("invalid header name: {e}")))?;
                req.set_header(name, &self.value)?;
            }
            if let Some(param) = &self.query_param {
                req.push_query_param(param, &self.value);
            }
            Ok(())
        })
    }
}
