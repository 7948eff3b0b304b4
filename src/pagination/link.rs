//! `Link`-header pagination (spec §4.3 "Link-header pager").
//!
//! Parses the standard `<url>; rel="name"` grammar (RFC 8288), resolving
//! a relative or scheme-relative `next` URL against the request that
//! produced it. Missing or malformed headers, or the absence of a
//! `rel="next"` segment, terminate the loop.

use super::Pager;
use crate::error::SiphonError;
use crate::request::PendingRequest;
use crate::transport::RawResponse;
use serde_json::Value;
use std::sync::Mutex;
use url::Url;

struct State {
    next_url: Option<Url>,
    first: bool,
}

#[derive(Default)]
pub struct LinkPager {
    state: Mutex<State>,
}

impl Default for State {
    fn default() -> Self {
        Self { next_url: None, first: true }
    }
}

impl LinkPager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Pager for LinkPager {
    fn next_request(&self, base: &PendingRequest) -> Option<PendingRequest> {
        #[expect(clippy::unwrap_used, reason = "poisoned only on a prior panic mid-update")]
        let mut state = self.state.lock().unwrap();
        if state.first {
            state.first = false;
            return Some(base.clone());
        }
        let next_url = state.next_url.take()?;
        let mut req = base.clone();
        req.url = next_url;
        Some(req)
    }

    fn update_state(
        &self,
        request: &PendingRequest,
        response: &RawResponse,
        _body: &Value,
    ) -> Result<(), SiphonError> {
        let next_url = response
            .headers
            .get_all(reqwest::header::LINK)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|value| find_next_href(value))
            .and_then(|href| request.url.join(&href).ok());

        #[expect(clippy::unwrap_used, reason = "poisoned only on a prior panic mid-update")]
        let mut state = self.state.lock().unwrap();
        state.next_url = next_url;
        Ok(())
    }
}

/// Find the `href` of the first segment whose `rel` is exactly `next`.
fn find_next_href(header_value: &str) -> Option<String> {
    for segment in split_top_level_commas(header_value) {
        let segment = segment.trim();
        let Some(rest) = segment.strip_prefix('<') else { continue };
        let Some(end) = rest.find('>') else { continue };
        let Some(href) = rest.get(..end) else { continue };
        let params = rest.get(end + 1..).unwrap_or_default();
        if has_rel_next(params) {
            return Some(href.to_string());
        }
    }
    None
}

fn has_rel_next(params: &str) -> bool {
    params.split(';').map(str::trim).any(|part| {
        part.strip_prefix("rel=")
            .map(|v| v.trim_matches('"'))
            .is_some_and(|v| v == "next")
    })
}

/// Split on commas that are not inside `<...>` (a URL may itself contain
/// commas, though rarely; this keeps the parser correct regardless).
fn split_top_level_commas(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, ch) in value.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                if let Some(part) = value.get(start..idx) {
                    parts.push(part);
                }
                start = idx + 1;
            }
            _ => {}
        }
    }
    if let Some(part) = value.get(start..) {
        parts.push(part);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use reqwest::header::{HeaderMap, HeaderValue};

    fn base() -> PendingRequest {
        PendingRequest::new(Method::GET, Url::parse("http://host/api/data").expect("url"))
    }

    #[test]
    fn follows_relative_next_url() {
        let pager = LinkPager::new();
        let base = base();
        let first = pager.next_request(&base).expect("first");

        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::LINK,
            HeaderValue::from_static(r#"</api/data?page=2>; rel="next""#),
        );
        let response = RawResponse { status: 200, headers, body: bytes::Bytes::new() };
        pager.update_state(&first, &response, &Value::Null).expect("update");

        let second = pager.next_request(&base).expect("second");
        assert_eq!(second.url.as_str(), "http://host/api/data?page=2");
    }

    #[test]
    fn missing_next_rel_terminates() {
        let pager = LinkPager::new();
        let base = base();
        let first = pager.next_request(&base).expect("first");

        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::LINK,
            HeaderValue::from_static(r#"</api/data?page=1>; rel="prev""#),
        );
        let response = RawResponse { status: 200, headers, body: bytes::Bytes::new() };
        pager.update_state(&first, &response, &Value::Null).expect("update");

        assert!(pager.next_request(&base).is_none());
    }

    #[test]
    fn multi_rel_header_picks_next_among_siblings() {
        let pager = LinkPager::new();
        let base = base();
        let first = pager.next_request(&base).expect("first");

        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::LINK,
            HeaderValue::from_static(
                r#"</api/data?page=1>; rel="prev", </api/data?page=3>; rel="next", </api/data?page=5>; rel="last""#,
            ),
        );
        let response = RawResponse { status: 200, headers, body: bytes::Bytes::new() };
        pager.update_state(&first, &response, &Value::Null).expect("update");

        let second = pager.next_request(&base).expect("second");
        assert_eq!(second.url.as_str(), "http://host/api/data?page=3");
    }

    #[test]
    fn scheme_relative_next_resolves_against_current_scheme() {
        let pager = LinkPager::new();
        let mut base = base();
        base.url = Url::parse("https://host/api/data").expect("url");
        let first = pager.next_request(&base).expect("first");

        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::LINK, HeaderValue::from_static(r#"<//other/data?p=2>; rel="next""#));
        let response = RawResponse { status: 200, headers, body: bytes::Bytes::new() };
        pager.update_state(&first, &response, &Value::Null).expect("update");

        let second = pager.next_request(&base).expect("second");
        assert_eq!(second.url.as_str(), "https://other/data?p=2");
    }
}
