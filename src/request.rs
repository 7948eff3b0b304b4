//! REST and GraphQL request builders (spec §4.?? component "Request
//! builders", driven by the source configuration in spec §6).

use crate::config::{GraphqlSourceConfig, RestSourceConfig};
use crate::error::SiphonError;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value, json};
use url::Url;

/// A request under construction: method, URL, headers and an optional JSON
/// body. Auth handlers and pagers mutate this before it is executed.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl PendingRequest {
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Append a query parameter, preserving any already present.
    pub fn push_query_param(&mut self, key: &str, value: &str) {
        self.url.query_pairs_mut().append_pair(key, value);
    }

    /// Set a header, failing if `value` is not a legal header value.
    ///
    /// # Errors
    ///
    /// Returns [`SiphonError::Authentication`] if `value` cannot be encoded
    /// as a header value.
    pub fn set_header(&mut self, name: HeaderName, value: &str) -> Result<(), SiphonError> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| SiphonError::authentication(format!("invalid header value: {e}")))?;
        self.headers.insert(name, value);
        Ok(())
    }
}

/// Builds base REST requests from a validated [`RestSourceConfig`].
pub struct RestRequestBuilder {
    method: Method,
    url: Url,
    headers: HeaderMap,
}

impl RestRequestBuilder {
    /// # Errors
    ///
    /// Returns [`SiphonError::Configuration`] if the endpoint is not a valid
    /// URL or the method is not a recognised HTTP method.
    pub fn new(config: &RestSourceConfig) -> Result<Self, SiphonError> {
        let url = Url::parse(&config.endpoint)
            .map_err(|e| SiphonError::configuration(format!("invalid rest endpoint: {e}")))?;
        let method = config
            .method
            .parse::<Method>()
            .map_err(|e| SiphonError::configuration(format!("invalid http method: {e}")))?;
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SiphonError::configuration(format!("invalid header name: {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| SiphonError::configuration(format!("invalid header value: {e}")))?;
            headers.insert(header_name, header_value);
        }
        let mut url = url;
        for (key, value) in &config.query_params {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(Self { method, url, headers })
    }

    #[must_use]
    pub fn build(&self) -> PendingRequest {
        PendingRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: None,
        }
    }
}

/// Builds GraphQL requests from a validated [`GraphqlSourceConfig`].
///
/// Holds the query and base variables immutably; [`Self::build_with_cursor`]
/// clones the base variables on every call rather than mutating shared
/// state, matching spec §4.3's requirement that "builder state is never
/// mutated directly".
pub struct GraphqlRequestBuilder {
    method: Method,
    url: Url,
    headers: HeaderMap,
    query: String,
    variables: Map<String, Value>,
}

impl GraphqlRequestBuilder {
    /// # Errors
    ///
    /// Returns [`SiphonError::Configuration`] if the endpoint is not a valid
    /// URL or the method is not recognised.
    pub fn new(config: &GraphqlSourceConfig) -> Result<Self, SiphonError> {
        let url = Url::parse(&config.endpoint)
            .map_err(|e| SiphonError::configuration(format!("invalid graphql endpoint: {e}")))?;
        let method = config
            .method
            .parse::<Method>()
            .map_err(|e| SiphonError::configuration(format!("invalid http method: {e}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        for (name, value) in &config.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SiphonError::configuration(format!("invalid header name: {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| SiphonError::configuration(format!("invalid header value: {e}")))?;
            headers.insert(header_name, header_value);
        }
        Ok(Self {
            method,
            url,
            headers,
            query: config.graphql.query.clone(),
            variables: config.graphql.variables.clone(),
        })
    }

    /// Build a request, optionally overriding one variable (used by the
    /// GraphQL cursor pager to inject the cursor without mutating `self`).
    #[must_use]
    pub fn build_with_cursor(&self, cursor_override: Option<(&str, &str)>) -> PendingRequest {
        let mut variables = self.variables.clone();
        if let Some((name, value)) = cursor_override {
            variables.insert(name.to_string(), Value::String(value.to_string()));
        }
        let body = json!({ "query": self.query, "variables": Value::Object(variables) });
        PendingRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: Some(body),
        }
    }

    #[must_use]
    pub fn build(&self) -> PendingRequest {
        self.build_with_cursor(None)
    }
}
