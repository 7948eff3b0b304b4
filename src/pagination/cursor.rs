//! Opaque-cursor REST pagination (spec §4.3 "Cursor pager (REST)").
//!
//! A missing cursor field, a non-string value, or an empty string all
//! terminate the loop — this specification adopts the permissive
//! termination variant (missing = end) rather than treating it as an
//! error.

use super::Pager;
use crate::config::CursorPaginationConfig;
use crate::error::SiphonError;
use crate::request::PendingRequest;
use crate::transport::RawResponse;
use serde_json::Value;
use std::sync::Mutex;

struct State {
    cursor: Option<String>,
    first: bool,
}

pub struct CursorPager {
    cursor_param: String,
    cursor_path: String,
    state: Mutex<State>,
}

impl CursorPager {
    #[must_use]
    pub fn new(config: &CursorPaginationConfig) -> Self {
        Self {
            cursor_param: config.cursor_param.clone(),
            cursor_path: config.cursor_path.clone(),
            state: Mutex::new(State { cursor: None, first: true }),
        }
    }
}

impl Pager for CursorPager {
    fn next_request(&self, base: &PendingRequest) -> Option<PendingRequest> {
        #[expect(clippy::unwrap_used, reason = "poisoned only on a prior panic mid-update")]
        let mut state = self.state.lock().unwrap();
        if state.first {
            state.first = false;
            return Some(base.clone());
        }
        let cursor = state.cursor.clone()?;
        if cursor.is_empty() {
            return None;
        }
        let mut req = base.clone();
        req.push_query_param(&self.cursor_param, &cursor);
        Some(req)
    }

    fn update_state(
        &self,
        _request: &PendingRequest,
        _response: &RawResponse,
        body: &Value,
    ) -> Result<(), SiphonError> {
        let (value, found) = crate::value::evaluate(body, &self.cursor_path);
        let cursor = if found {
            value.as_ref().and_then(Value::as_str).map(str::to_owned).filter(|s| !s.is_empty())
        } else {
            None
        };
        #[expect(clippy::unwrap_used, reason = "poisoned only on a prior panic mid-update")]
        let mut state = self.state.lock().unwrap();
        state.cursor = cursor;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use serde_json::json;
    use url::Url;

    fn base() -> PendingRequest {
        PendingRequest::new(Method::GET, Url::parse("https://api.example.com/items").expect("url"))
    }

    fn config() -> CursorPaginationConfig {
        CursorPaginationConfig { cursor_param: "cursor".into(), cursor_path: "next_cursor".into() }
    }

    #[test]
    fn terminates_on_null_cursor() {
        let pager = CursorPager::new(&config());
        let base = base();
        let response = RawResponse { status: 200, headers: Default::default(), body: bytes::Bytes::new() };

        let first = pager.next_request(&base).expect("first has no cursor param");
        assert!(first.url.query().is_none());
        pager.update_state(&first, &response, &json!({"items": [], "next_cursor": "abc"})).expect("update");

        let second = pager.next_request(&base).expect("second uses stored cursor");
        assert_eq!(second.url.query(), Some("cursor=abc"));
        pager.update_state(&second, &response, &json!({"items": [], "next_cursor": null})).expect("update");

        assert!(pager.next_request(&base).is_none());
    }

    #[test]
    fn missing_cursor_field_terminates() {
        let pager = CursorPager::new(&config());
        let base = base();
        let response = RawResponse { status: 200, headers: Default::default(), body: bytes::Bytes::new() };
        let first = pager.next_request(&base).expect("first");
        pager.update_state(&first, &response, &json!({"items": []})).expect("update");
        assert!(pager.next_request(&base).is_none());
    }
}
