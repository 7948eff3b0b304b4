//! The extraction orchestrator (spec §4.6): wires authentication,
//! pagination, retry, and extraction together and drives the
//! request/response loop to completion.

use crate::auth::oauth2::OAuth2Auth;
use crate::auth::retry_transport::OAuth2RetryTransport;
use crate::auth::{self, AuthHandler};
use crate::config::{AuthSpec, PipelineConfig, ResponseMapping, SourceConfig};
use crate::error::SiphonError;
use crate::extract::{Extractor, GraphqlExtractor, Record, RestExtractor, map_item};
use crate::pagination::{Pager, build_pager};
use crate::request::{GraphqlRequestBuilder, PendingRequest, RestRequestBuilder};
use crate::retry::{RetryPolicy, RetryTransport};
use crate::transport::{RawResponse, ReqwestTransport, Transport};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Safety cap on pagination loop iterations, mirroring the teacher's
/// `MAX_PAGES` guard against cursors that never terminate.
const MAX_PAGES: usize = 10_000;

enum RequestBuilder {
    Rest(RestRequestBuilder),
    Graphql(GraphqlRequestBuilder),
}

impl RequestBuilder {
    fn build(&self) -> PendingRequest {
        match self {
            Self::Rest(b) => b.build(),
            Self::Graphql(b) => b.build(),
        }
    }
}

/// Drives one pipeline's extraction end to end.
///
/// Built once from a validated [`PipelineConfig`] and safe to share across
/// concurrent [`Connector::extract`] calls (spec §5): the only mutable
/// state contacted by more than one call is the OAuth2 handler, which
/// guards itself internally.
pub struct Connector {
    transport: Box<dyn Transport>,
    auth: Option<Arc<dyn AuthHandler>>,
    pagination: Option<crate::config::PaginationSpec>,
    mapping: ResponseMapping,
    extractor: Box<dyn Extractor>,
    base_builder: RequestBuilder,
}

impl Connector {
    /// Build a connector from a validated pipeline configuration.
    ///
    /// If the configured auth is OAuth2, the 401-transparent-retry
    /// transport layer is wired in and no standalone auth handler is kept
    /// — exactly one of the two is ever active (spec §9 open question).
    ///
    /// # Errors
    ///
    /// Returns [`SiphonError::Configuration`] if `config` fails
    /// validation, or if the endpoint/method fields cannot be parsed.
    pub fn new(config: PipelineConfig) -> Result<Self, SiphonError> {
        config.validate()?;

        let (mapping, auth_spec) = match &config.source {
            SourceConfig::Rest(rest) => (rest.response_mapping.clone(), rest.auth.clone()),
            SourceConfig::Graphql(gql) => (gql.response_mapping.clone(), gql.auth.clone()),
        };

        let extractor: Box<dyn Extractor> = match &config.source {
            SourceConfig::Rest(_) => Box::new(RestExtractor::new(mapping.clone())),
            SourceConfig::Graphql(_) => Box::new(GraphqlExtractor::new(mapping.clone())),
        };

        let mut transport: Box<dyn Transport> = Box::new(ReqwestTransport::default());
        if let Some(retry_spec) = &config.retry_config {
            transport = Box::new(RetryTransport::new(transport, RetryPolicy::from(retry_spec)));
        }

        let mut standalone_auth: Option<Arc<dyn AuthHandler>> = None;
        if let Some(spec) = &auth_spec {
            match spec {
                AuthSpec::Oauth2(oauth_config) => {
                    spec.validate()?;
                    let oauth = OAuth2Auth::new(oauth_config.clone());
                    transport = Box::new(OAuth2RetryTransport::new(transport, oauth));
                }
                other => standalone_auth = Some(auth::build_handler(other)?),
            }
        }

        let base_builder = match &config.source {
            SourceConfig::Rest(rest) => RequestBuilder::Rest(RestRequestBuilder::new(rest)?),
            SourceConfig::Graphql(gql) => RequestBuilder::Graphql(GraphqlRequestBuilder::new(gql)?),
        };

        Ok(Self {
            transport,
            auth: standalone_auth,
            pagination: config.pagination,
            mapping,
            extractor,
            base_builder,
        })
    }

    /// Run the extraction to completion, collecting every page's records.
    ///
    /// # Errors
    ///
    /// Surfaces the error taxonomy in spec §7; cancellation via `cancel`
    /// surfaces [`SiphonError::Cancelled`].
    pub async fn extract(&self, cancel: &CancellationToken) -> Result<Vec<Record>, SiphonError> {
        let base = self.base_builder.build();
        match &self.pagination {
            Some(spec) => self.extract_paginated(base, spec, cancel).await,
            None => self.extract_single(base, cancel).await,
        }
    }

    /// Convenience entry point for callers with no cancellation handle.
    ///
    /// # Errors
    ///
    /// See [`Self::extract`].
    pub async fn extract_uncancellable(&self) -> Result<Vec<Record>, SiphonError> {
        self.extract(&CancellationToken::new()).await
    }

    async fn send(&self, req: &PendingRequest, cancel: &CancellationToken) -> Result<RawResponse, SiphonError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(SiphonError::Cancelled),
            result = self.transport.send(req) => result,
        }
    }

    async fn apply_standalone_auth(&self, req: &mut PendingRequest) -> Result<(), SiphonError> {
        if let Some(auth) = &self.auth {
            auth.apply(req).await?;
        }
        Ok(())
    }

    async fn extract_single(&self, base: PendingRequest, cancel: &CancellationToken) -> Result<Vec<Record>, SiphonError> {
        let mut req = base;
        self.apply_standalone_auth(&mut req).await?;
        let response = self.send(&req, cancel).await?;
        if !response.is_success() {
            return Err(SiphonError::http_response(response.status, "non-success status"));
        }
        let body = decode_body(&response)?;
        let items = self.extractor.items(&body)?;
        project_items(&self.mapping, items)
    }

    async fn extract_paginated(
        &self,
        base: PendingRequest,
        spec: &crate::config::PaginationSpec,
        cancel: &CancellationToken,
    ) -> Result<Vec<Record>, SiphonError> {
        let pager = build_pager(spec);
        let mut records = Vec::new();
        let mut request = pager.next_request(&base);
        let mut pages = 0usize;

        while let Some(page_request) = request {
            pages += 1;
            if pages > MAX_PAGES {
                return Err(SiphonError::pagination(format!("exceeded max pages {MAX_PAGES}")));
            }

            let mut to_send = page_request.clone();
            self.apply_standalone_auth(&mut to_send).await?;
            let response = self.send(&to_send, cancel).await?;

            if response.status == 429 {
                return Err(SiphonError::pagination("received 429 during pagination"));
            }
            if !response.is_success() {
                return Err(SiphonError::http_response(response.status, "non-success status during pagination"));
            }

            let body = decode_body(&response)?;
            pager.update_state(&to_send, &response, &body)?;
            let items = self.extractor.items(&body)?;
            records.extend(project_items(&self.mapping, items)?);

            request = pager.next_request(&base);
        }

        Ok(records)
    }
}

fn decode_body(response: &RawResponse) -> Result<Value, SiphonError> {
    serde_json::from_slice(&response.body)
        .map_err(|e| SiphonError::http_response(response.status, format!("invalid json body: {e}")))
}

fn project_items(mapping: &ResponseMapping, items: Vec<Value>) -> Result<Vec<Record>, SiphonError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| map_item(mapping, &item, index))
        .collect()
}
