//! Pluggable authentication handlers (spec §4.2).
//!
//! Every handler implements [`AuthHandler::apply`]: mutate a request's
//! headers and/or query string to carry credentials, or fail. Handlers are
//! constructed from an [`AuthSpec`](crate::config::AuthSpec) by
//! [`build_handler`].

mod api_key;
mod basic;
mod bearer;
pub mod oauth2;
pub mod retry_transport;

pub use api_key::ApiKeyAuth;
pub use basic::BasicAuth;
pub use bearer::BearerAuth;
pub use oauth2::OAuth2Auth;

use crate::config::AuthSpec;
use crate::error::SiphonError;
use crate::request::PendingRequest;
use crate::transport::BoxFuture;
use std::sync::Arc;

/// Applies credentials to an outgoing request.
pub trait AuthHandler: Send + Sync {
    fn apply<'a>(&'a self, req: &'a mut PendingRequest) -> BoxFuture<'a, Result<(), SiphonError>>;
}

/// Build the handler named by `spec`.
///
/// # Errors
///
/// Returns [`SiphonError::Configuration`] if `spec` fails its own field
/// validation.
pub fn build_handler(spec: &AuthSpec) -> Result<Arc<dyn AuthHandler>, SiphonError> {
    spec.validate()?;
    let handler: Arc<dyn AuthHandler> = match spec {
        AuthSpec::Basic(c) => Arc::new(BasicAuth::new(c.username.clone(), c.password.clone())),
        AuthSpec::ApiKey(c) => Arc::new(ApiKeyAuth::new(
            c.value.clone(),
            c.header.clone(),
            c.query_param.clone(),
        )),
        AuthSpec::Bearer(c) => Arc::new(BearerAuth::new(c.token.clone())),
        AuthSpec::Oauth2(c) => Arc::new(OAuth2Auth::new(c.clone())),
    };
    Ok(handler)
}
