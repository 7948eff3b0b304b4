//! Bearer token authentication (spec §4.2): `Authorization: Bearer <token>`.

use super::AuthHandler;
use crate::error::SiphonError;
use crate::request::PendingRequest;
use crate::transport::BoxFuture;
use reqwest::header::AUTHORIZATION;

pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self { token }
    }
}

impl AuthHandler for BearerAuth {
    fn apply<'a>(&'a self, req: &'a mut PendingRequest) -> BoxFuture<'a, Result<(), SiphonError>> {
        Box::pin(async move { req.set_header(AUTHORIZATION, &format!("Bearer {}", self.token)) })
    }
}
