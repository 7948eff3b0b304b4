//! GraphQL cursor-connection pagination (spec §4.3 "GraphQL cursor
//! pager"). Injects the cursor into the request's `variables` object
//! without mutating any shared builder state.

use super::Pager;
use crate::config::GraphqlCursorPaginationConfig;
use crate::error::SiphonError;
use crate::request::PendingRequest;
use crate::transport::RawResponse;
use serde_json::Value;
use std::sync::Mutex;

struct State {
    cursor: Option<String>,
    has_next: bool,
    first: bool,
}

pub struct GraphqlCursorPager {
    cursor_variable: String,
    end_cursor_path: String,
    has_next_page_path: String,
    state: Mutex<State>,
}

impl GraphqlCursorPager {
    #[must_use]
    pub fn new(config: &GraphqlCursorPaginationConfig) -> Self {
        Self {
            cursor_variable: config.cursor_variable.clone(),
            end_cursor_path: config.end_cursor_path.clone(),
            has_next_page_path: config.has_next_page_path.clone(),
            state: Mutex::new(State { cursor: None, has_next: false, first: true }),
        }
    }
}

impl Pager for GraphqlCursorPager {
    fn next_request(&self, base: &PendingRequest) -> Option<PendingRequest> {
        #[expect(clippy::unwrap_used, reason = "poisoned only on a prior panic mid-update")]
        let mut state = self.state.lock().unwrap();
        if state.first {
            state.first = false;
            return Some(base.clone());
        }
        if !state.has_next {
            return None;
        }
        let cursor = state.cursor.clone()?;
        let mut req = base.clone();
        if let Some(Value::Object(obj)) = &mut req.body {
            if let Some(Value::Object(vars)) = obj.get_mut("variables") {
                vars.insert(self.cursor_variable.clone(), Value::String(cursor));
            }
        }
        Some(req)
    }

    fn update_state(
        &self,
        _request: &PendingRequest,
        _response: &RawResponse,
        body: &Value,
    ) -> Result<(), SiphonError> {
        let (cursor_value, cursor_found) = crate::value::evaluate(body, &self.end_cursor_path);
        let cursor = if cursor_found {
            cursor_value.as_ref().and_then(Value::as_str).map(str::to_owned).filter(|s| !s.is_empty())
        } else {
            None
        };
        let (has_next_value, has_next_found) = crate::value::evaluate(body, &self.has_next_page_path);
        let has_next = has_next_found && has_next_value.as_ref().and_then(Value::as_bool).unwrap_or(false);

        #[expect(clippy::unwrap_used, reason = "poisoned only on a prior panic mid-update")]
        let mut state = self.state.lock().unwrap();
        state.has_next = has_next && cursor.is_some();
        state.cursor = cursor;
        Ok(())
    }
}
