//! Page-number pagination (spec §4.3 "Page pager").

use super::{Pager, data_field_non_empty};
use crate::config::PagePaginationConfig;
use crate::error::SiphonError;
use crate::request::PendingRequest;
use crate::transport::RawResponse;
use serde_json::Value;
use std::sync::Mutex;

struct State {
    page: u64,
    first: bool,
    has_more: bool,
}

pub struct PagePager {
    page_param: String,
    size_param: String,
    has_more_path: Option<String>,
    total_pages_path: Option<String>,
    page_size: u64,
    state: Mutex<State>,
}

impl PagePager {
    #[must_use]
    pub fn new(config: &PagePaginationConfig) -> Self {
        Self {
            page_param: config.page_param.clone(),
            size_param: config.size_param.clone(),
            has_more_path: config.has_more_path.clone(),
            total_pages_path: config.total_pages_path.clone(),
            page_size: config.page_size,
            state: Mutex::new(State {
                page: config.start_page,
                first: true,
                has_more: true,
            }),
        }
    }
}

impl Pager for PagePager {
    fn next_request(&self, base: &PendingRequest) -> Option<PendingRequest> {
        #[expect(clippy::unwrap_used, reason = "poisoned only on a prior panic mid-update")]
        let mut state = self.state.lock().unwrap();
        if !state.first && !state.has_more {
            return None;
        }
        if state.first {
            state.first = false;
        } else {
            state.page += 1;
        }
        let mut req = base.clone();
        req.push_query_param(&self.page_param, &state.page.to_string());
        req.push_query_param(&self.size_param, &self.page_size.to_string());
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
        state.has_more = if let Some(path) = &self.total_pages_path {
            let (value, found) = crate::value::evaluate(body, path);
            let total_pages = value.as_ref().and_then(Value::as_u64);
            found && total_pages.is_some_and(|total| state.page < total)
        } else if let Some(path) = &self.has_more_path {
            let (value, found) = crate::value::evaluate(body, path);
            found && value.as_ref().and_then(Value::as_bool).unwrap_or(false)
        } else {
            data_field_non_empty(body)
        };
        Ok(())
    }
}
