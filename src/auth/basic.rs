//! HTTP Basic authentication (spec §4.2): `Authorization: Basic
//! base64(username:password)`.

use super::AuthHandler;
use crate::error::SiphonError;
use crate::request::PendingRequest;
use crate::transport::BoxFuture;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::AUTHORIZATION;

pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    #[must_use]
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }
}

impl AuthHandler for BasicAuth {
    fn apply<'a>(&'a self, req: &'a mut PendingRequest) -> BoxFuture<'a, Result<(), SiphonError>> {
        Box::pin(async move {
            let credentials = format!("{}:{}", self.username, self.password);
            let encoded = STANDARD.encode(credentials.as_bytes());
            req.set_header(AUTHORIZATION, &format!("Basic {encoded}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use url::Url;

    #[tokio::test]
    async fn encodes_username_and_password() {
        let auth = BasicAuth::new("alice".into(), "hunter2".into());
        let mut req = PendingRequest::new(Method::GET, Url::parse("https://api.example.com/x").expect("url"));
        auth.apply(&mut req).await.expect("apply");
        let header = req.headers.get(AUTHORIZATION).expect("header set").to_str().expect("ascii");
        assert_eq!(header, "Basic YWxpY2U6aHVudGVyMg==");
    }

    #[tokio::test]
    async fn allows_empty_password() {
        let auth = BasicAuth::new("alice".into(), String::new());
        let mut req = PendingRequest::new(Method::GET, Url::parse("https://api.example.com/x").expect("url"));
        auth.apply(&mut req).await.expect("apply");
        let header = req.headers.get(AUTHORIZATION).expect("header set").to_str().expect("ascii");
        assert_eq!(header, "Basic YWxpY2U6");
    }
}
