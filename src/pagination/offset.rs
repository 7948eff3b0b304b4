//! Offset-based pagination (spec §4.3 "Offset pager").

use super::{Pager, data_field_non_empty};
use crate::config::OffsetPaginationConfig;
use crate::error::SiphonError;
use crate::request::PendingRequest;
use crate::transport::RawResponse;
use serde_json::Value;
use std::sync::Mutex;

struct State {
    offset: u64,
    first: bool,
    has_more: bool,
}

pub struct OffsetPager {
    offset_param: String,
    limit_param: String,
    has_more_path: Option<String>,
    total_count_path: Option<String>,
    offset_increment: u64,
    state: Mutex<State>,
}

impl OffsetPager {
    #[must_use]
    pub fn new(config: &OffsetPaginationConfig) -> Self {
        Self {
            offset_param: config.offset_param.clone(),
            limit_param: config.limit_param.clone(),
            has_more_path: config.has_more_path.clone(),
            total_count_path: config.total_count_path.clone(),
            offset_increment: config.offset_increment,
            state: Mutex::new(State {
                offset: config.start_offset,
                first: true,
                has_more: true,
            }),
        }
    }
}

impl Pager for OffsetPager {
    fn next_request(&self, base: &PendingRequest) -> Option<PendingRequest> {
        #[expect(clippy::unwrap_used, reason = "poisoned only on a prior panic mid-update")]
        let mut state = self.state.lock().unwrap();
        if !state.first && !state.has_more {
            return None;
        }
        if state.first {
            state.first = false;
        } else {
            state.offset += self.offset_increment;
        }
        let mut req = base.clone();
        req.push_query_param(&self.offset_param, &state.offset.to_string());
        req.push_query_param(&self.limit_param, &self.offset_increment.to_string());
        Some(req)
    }

    fn update_state(
        &self,
        _request: &PendingRequest,
        _response: &RawResponse,
        body: &Value,
    ) -> Result<(), SiphonError> {
        #[expect(clippy::unwrap_used, reason = "poisoned only on a prior panic mid-update")]
        let mut state = self.state.lock().unwrap();
        state.has_more = if let Some(path) = &self.total_count_path {
            let (value, found) = crate::value::evaluate(body, path);
            let total_count = value.as_ref().and_then(Value::as_u64);
            found && total_count.is_some_and(|total| state.offset + self.offset_increment < total)
        } else if let Some(path) = &self.has_more_path {
            let (value, found) = crate::value::evaluate(body, path);
            found && value.as_ref().and_then(Value::as_bool).unwrap_or(false)
        } else {
            data_field_non_empty(body)
        };
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

    fn config() -> OffsetPaginationConfig {
        OffsetPaginationConfig {
            offset_param: "offset".into(),
            limit_param: "limit".into(),
            has_more_path: None,
            total_count_path: Some("total".into()),
            start_offset: 0,
            offset_increment: 10,
        }
    }

    #[test]
    fn stops_at_exact_total_count_boundary() {
        let pager = OffsetPager::new(&config());
        let base = base();
        let response = RawResponse { status: 200, headers: Default::default(), body: bytes::Bytes::new() };

        let first = pager.next_request(&base).expect("first");
        assert_eq!(first.url.query(), Some("offset=0&limit=10"));
        pager.update_state(&first, &response, &json!({"total": 20})).expect("update");

        let second = pager.next_request(&base).expect("second");
        assert_eq!(second.url.query(), Some("offset=10&limit=10"));
        pager.update_state(&second, &response, &json!({"total": 20})).expect("update");

        assert!(pager.next_request(&base).is_none());
    }
}
