//! OAuth2 client-credentials / refresh-token authentication (spec §4.2).
//!
//! Mirrors the single-flight refresh pattern: the fast path takes a read
//! lock and returns the cached token immediately; the first caller that
//! finds it expired (or absent) takes the write lock, marks `refreshing`,
//! drops the lock for the network round trip, then re-acquires it to store
//! the result. Concurrent callers that observe `refreshing` yield and
//! retry rather than piling onto the same request.

use super::AuthHandler;
use crate::config::OAuth2AuthConfig;
use crate::error::SiphonError;
use crate::request::PendingRequest;
use crate::transport::BoxFuture;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

const DEFAULT_EXPIRY: Duration = Duration::from_secs(3600);

struct TokenState {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<Instant>,
    refreshing: bool,
    /// Set once the cached token is known to have fully expired with no
    /// successful refresh since: distinguishes [`SiphonError::TokenExpired`]
    /// from a plain [`SiphonError::Authentication`] on initial acquisition.
    ever_had_token: bool,
}

/// OAuth2 client-credentials or refresh-token authentication handler.
pub struct OAuth2Auth {
    config: OAuth2AuthConfig,
    client: reqwest::Client,
    state: RwLock<TokenState>,
}

impl OAuth2Auth {
    #[must_use]
    pub fn new(config: OAuth2AuthConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            state: RwLock::new(TokenState {
                access_token: None,
                refresh_token: None,
                expires_at: None,
                refreshing: false,
                ever_had_token: false,
            }),
        }
    }

    fn needs_refresh(&self, state: &TokenState) -> bool {
        let Some(token) = &state.access_token else {
            return true;
        };
        if token.is_empty() {
            return true;
        }
        match state.expires_at {
            Some(expires_at) => {
                let buffer = Duration::from_secs(self.config.refresh_before_seconds);
                Instant::now() + buffer >= expires_at
            }
            None => false,
        }
    }

    async fn request_token(&self, refresh_token: Option<&str>) -> Result<TokenResponse, SiphonError> {
        let mut form: Vec<(&str, &str)> = Vec::new();
        let grant_type = if refresh_token.is_some() { "refresh_token" } else { "client_credentials" };
        form.push(("grant_type", grant_type));
        if let Some(token) = refresh_token {
            form.push(("refresh_token", token));
        }
        form.push(("client_id", &self.config.client_id));
        form.push(("client_secret", &self.config.client_secret));
        if let Some(scope) = &self.config.scope {
            form.push(("scope", scope));
        }
        for (key, value) in &self.config.extra_params {
            form.push((key, value));
        }

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| SiphonError::authentication(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SiphonError::authentication(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| SiphonError::authentication(format!("malformed token response: {e}")))
    }

    async fn refresh(&self) -> Result<(), SiphonError> {
        loop {
            {
                let state = self.state.read().await;
                if !self.needs_refresh(&state) {
                    return Ok(());
                }
                if state.refreshing {
                    drop(state);
                    tokio::task::yield_now().await;
                    continue;
                }
            }

            let mut state = self.state.write().await;
            if !self.needs_refresh(&state) {
                return Ok(());
            }
            if state.refreshing {
                drop(state);
                tokio::task::yield_now().await;
                continue;
            }
            state.refreshing = true;
            let refresh_token = state.refresh_token.clone();
            let had_token = state.ever_had_token;
            drop(state);

            let result = self.request_token(refresh_token.as_deref()).await;

            let mut state = self.state.write().await;
            state.refreshing = false;
            match result {
                Ok(token) => {
                    let expires_in = token
                        .expires_in
                        .filter(|secs| *secs > 0)
                        .and_then(|secs| u64::try_from(secs).ok())
                        .map_or(DEFAULT_EXPIRY, Duration::from_secs);
                    state.expires_at = Some(Instant::now() + expires_in);
                    state.access_token = Some(token.access_token);
                    if token.refresh_token.is_some() {
                        state.refresh_token = token.refresh_token;
                    }
                    state.ever_had_token = true;
                    return Ok(());
                }
                Err(err) => {
                    return if had_token {
                        Err(SiphonError::TokenExpired(err.to_string().into()))
                    } else {
                        Err(err)
                    };
                }
            }
        }
    }

    async fn token(&self) -> Result<String, SiphonError> {
        self.refresh().await?;
        let state = self.state.read().await;
        state
            .access_token
            .clone()
            .ok_or_else(|| SiphonError::authentication("token cache empty after refresh"))
    }
}

impl AuthHandler for OAuth2Auth {
    fn apply<'a>(&'a self, req: &'a mut PendingRequest) -> BoxFuture<'a, Result<(), SiphonError>> {
        Box::pin(async move {
            let token = self.token().await?;
            req.set_header(AUTHORIZATION, &format!("Bearer {token}"))
        })
    }
}

impl super::retry_transport::RefreshableAuth for OAuth2Auth {
    /// Invalidate the cached token so the next call refreshes
    /// unconditionally. Called by [`super::retry_transport`] after
    /// observing a 401.
    fn invalidate(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            state.access_token = None;
            state.expires_at = None;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::retry_transport::RefreshableAuth as _;

    fn config() -> OAuth2AuthConfig {
        OAuth2AuthConfig {
            token_url: "https://auth.example.com/token".into(),
            client_id: "id".into(),
            client_secret: "secret".into(),
            scope: None,
            extra_params: Default::default(),
            refresh_before_seconds: 60,
        }
    }

    #[tokio::test]
    async fn needs_refresh_when_no_token_cached() {
        let auth = OAuth2Auth::new(config());
        let state = auth.state.read().await;
        assert!(auth.needs_refresh(&state));
    }

    #[tokio::test]
    async fn does_not_need_refresh_well_before_expiry() {
        let auth = OAuth2Auth::new(config());
        {
            let mut state = auth.state.write().await;
            state.access_token = Some("tok".into());
            state.expires_at = Some(Instant::now() + Duration::from_secs(3600));
        }
        let state = auth.state.read().await;
        assert!(!auth.needs_refresh(&state));
    }

    #[tokio::test]
    async fn needs_refresh_inside_refresh_before_window() {
        let auth = OAuth2Auth::new(config());
        {
            let mut state = auth.state.write().await;
            state.access_token = Some("tok".into());
            state.expires_at = Some(Instant::now() + Duration::from_secs(10));
        }
        let state = auth.state.read().await;
        assert!(auth.needs_refresh(&state));
    }

    #[tokio::test]
    async fn invalidate_clears_cached_token() {
        let auth = OAuth2Auth::new(config());
        {
            let mut state = auth.state.write().await;
            state.access_token = Some("tok".into());
            state.expires_at = Some(Instant::now() + Duration::from_secs(3600));
        }
        auth.invalidate().await;
        let state = auth.state.read().await;
        assert!(auth.needs_refresh(&state));
    }
}
