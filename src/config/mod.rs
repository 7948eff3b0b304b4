//! The pipeline configuration data model and its validator.
//!
//! Loading YAML files and expanding `${VAR}` references is a convenience
//! layered on top in [`crate::config::loader`]; the orchestrator itself only
//! ever consumes an already-[`PipelineConfig::validate`]d value, matching
//! spec §3's description of the configuration as an immutable root value
//! supplied by an external collaborator.

pub mod loader;

use crate::error::SiphonError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

/// Root configuration value for one extraction pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub source: SourceConfig,
    #[serde(default)]
    pub pagination: Option<PaginationSpec>,
    #[serde(default)]
    pub retry_config: Option<RetryConfigSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum SourceConfig {
    Rest(RestSourceConfig),
    Graphql(GraphqlSourceConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestSourceConfig {
    pub endpoint: String,
    #[serde(default = "default_get")]
    pub method: String,
    #[serde(default)]
    pub headers: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub query_params: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub auth: Option<AuthSpec>,
    pub response_mapping: ResponseMapping,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlSourceConfig {
    pub endpoint: String,
    #[serde(default = "default_post")]
    pub method: String,
    #[serde(default)]
    pub headers: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub auth: Option<AuthSpec>,
    pub response_mapping: ResponseMapping,
    pub graphql: GraphqlBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlBody {
    pub query: String,
    #[serde(default)]
    pub variables: serde_json::Map<String, Value>,
}

fn default_get() -> String {
    "GET".to_string()
}

fn default_post() -> String {
    "POST".to_string()
}

/// Ordered list of field projections plus an optional root path to the
/// array of items inside a response.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ResponseMapping {
    #[serde(default)]
    pub root_path: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldMapping {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub default_value: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum PaginationSpec {
    Page(PagePaginationConfig),
    Offset(OffsetPaginationConfig),
    Cursor(CursorPaginationConfig),
    Link,
    GraphqlCursor(GraphqlCursorPaginationConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagePaginationConfig {
    #[serde(default = "default_page_param")]
    pub page_param: String,
    #[serde(default = "default_size_param")]
    pub size_param: String,
    #[serde(default)]
    pub has_more_path: Option<String>,
    #[serde(default)]
    pub total_pages_path: Option<String>,
    #[serde(default = "default_start_page")]
    pub start_page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OffsetPaginationConfig {
    #[serde(default = "default_offset_param")]
    pub offset_param: String,
    #[serde(default = "default_limit_param")]
    pub limit_param: String,
    #[serde(default)]
    pub has_more_path: Option<String>,
    #[serde(default)]
    pub total_count_path: Option<String>,
    #[serde(default)]
    pub start_offset: u64,
    #[serde(default = "default_page_size")]
    pub offset_increment: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CursorPaginationConfig {
    #[serde(default = "default_cursor_param")]
    pub cursor_param: String,
    pub cursor_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlCursorPaginationConfig {
    #[serde(default = "default_cursor_variable")]
    pub cursor_variable: String,
    pub end_cursor_path: String,
    pub has_next_page_path: String,
}

fn default_page_param() -> String {
    "page".to_string()
}
fn default_size_param() -> String {
    "page_size".to_string()
}
fn default_start_page() -> u64 {
    1
}
fn default_page_size() -> u64 {
    100
}
fn default_offset_param() -> String {
    "offset".to_string()
}
fn default_limit_param() -> String {
    "limit".to_string()
}
fn default_cursor_param() -> String {
    "cursor".to_string()
}
fn default_cursor_variable() -> String {
    "after".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfigSpec {
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_secs")]
    pub initial_backoff_secs: f64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default)]
    pub retryable_statuses: Vec<u16>,
}

fn default_initial_backoff_secs() -> f64 {
    0.5
}
fn default_backoff_multiplier() -> f64 {
    2.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum AuthSpec {
    Basic(BasicAuthConfig),
    ApiKey(ApiKeyAuthConfig),
    Bearer(BearerAuthConfig),
    Oauth2(OAuth2AuthConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct BasicAuthConfig {
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyAuthConfig {
    pub value: String,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub query_param: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BearerAuthConfig {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuth2AuthConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub extra_params: std::collections::HashMap<String, String>,
    #[serde(default = "default_refresh_before")]
    pub refresh_before_seconds: u64,
}

fn default_refresh_before() -> u64 {
    60
}

impl PipelineConfig {
    /// Validate cross-field invariants spec §3/§6 impose that `serde`'s
    /// structural deserialization cannot express on its own.
    ///
    /// # Errors
    ///
    /// Returns [`SiphonError::Configuration`] on the first violation found.
    pub fn validate(&self) -> Result<(), SiphonError> {
        if self.name.trim().is_empty() {
            return Err(SiphonError::configuration("pipeline name must be non-empty"));
        }
        let mapping = match &self.source {
            SourceConfig::Rest(rest) => {
                if rest.endpoint.trim().is_empty() {
                    return Err(SiphonError::configuration("rest source endpoint is required"));
                }
                &rest.response_mapping
            }
            SourceConfig::Graphql(gql) => {
                if gql.endpoint.trim().is_empty() {
                    return Err(SiphonError::configuration(
                        "graphql source endpoint is required",
                    ));
                }
                if gql.graphql.query.trim().is_empty() {
                    return Err(SiphonError::configuration("graphql query is required"));
                }
                &gql.response_mapping
            }
        };
        validate_mapping(mapping)?;
        if let Some(pagination) = &self.pagination {
            validate_pagination(pagination)?;
        }
        if let Some(retry) = &self.retry_config {
            validate_retry(retry)?;
        }
        Ok(())
    }
}

fn validate_mapping(mapping: &ResponseMapping) -> Result<(), SiphonError> {
    let mut seen = HashSet::new();
    for field in &mapping.fields {
        if field.name.trim().is_empty() {
            return Err(SiphonError::configuration("field mapping name must be non-empty"));
        }
        if field.path.trim().is_empty() {
            return Err(SiphonError::configuration(format!(
                "field mapping '{}' is missing a path",
                field.name
            )));
        }
        if !seen.insert(field.name.clone()) {
            return Err(SiphonError::configuration(format!(
                "duplicate field mapping name '{}'",
                field.name
            )));
        }
    }
    Ok(())
}

fn validate_pagination(pagination: &PaginationSpec) -> Result<(), SiphonError> {
    match pagination {
        PaginationSpec::Page(p) => {
            if p.start_page < 1 {
                return Err(SiphonError::configuration("page pagination start_page must be >= 1"));
            }
        }
        PaginationSpec::Offset(_) | PaginationSpec::Link => {}
        PaginationSpec::Cursor(c) => {
            if c.cursor_path.trim().is_empty() {
                return Err(SiphonError::configuration(
                    "cursor pagination requires cursor_path",
                ));
            }
        }
        PaginationSpec::GraphqlCursor(g) => {
            if g.end_cursor_path.trim().is_empty() || g.has_next_page_path.trim().is_empty() {
                return Err(SiphonError::configuration(
                    "graphql cursor pagination requires end_cursor_path and has_next_page_path",
                ));
            }
        }
    }
    Ok(())
}

fn validate_retry(retry: &RetryConfigSpec) -> Result<(), SiphonError> {
    if retry.max_attempts == 0 {
        return Err(SiphonError::configuration("retry_config.max_attempts must be > 0"));
    }
    if retry.initial_backoff_secs < 0.0 {
        return Err(SiphonError::configuration(
            "retry_config.initial_backoff_secs must be >= 0",
        ));
    }
    if retry.backoff_multiplier <= 0.0 {
        return Err(SiphonError::configuration(
            "retry_config.backoff_multiplier must be > 0",
        ));
    }
    Ok(())
}

impl AuthSpec {
    pub(crate) fn validate(&self) -> Result<(), SiphonError> {
        match self {
            Self::Basic(b) => {
                if b.username.trim().is_empty() {
                    return Err(SiphonError::configuration("basic auth requires username"));
                }
            }
            Self::ApiKey(k) => {
                if k.value.trim().is_empty() {
                    return Err(SiphonError::configuration("api_key auth requires value"));
                }
                if k.header.is_none() && k.query_param.is_none() {
                    return Err(SiphonError::configuration(
                        "api_key auth requires header or query_param",
                    ));
                }
            }
            Self::Bearer(b) => {
                if b.token.trim().is_empty() {
                    return Err(SiphonError::configuration("bearer auth requires token"));
                }
            }
            Self::Oauth2(o) => {
                if o.token_url.trim().is_empty()
                    || o.client_id.trim().is_empty()
                    || o.client_secret.trim().is_empty()
                {
                    return Err(SiphonError::configuration(
                        "oauth2 auth requires token_url, client_id and client_secret",
                    ));
                }
            }
        }
        Ok(())
    }
}
