//! Pagination strategies (spec §4.3): a shared contract over five kinds of
//! server pagination, each driving its own critical section under an
//! internal [`std::sync::Mutex`] so pagers stay `Send + Sync` trait
//! objects usable from the orchestrator's single driving loop.

mod cursor;
mod factory;
mod graphql_cursor;
mod link;
mod offset;
mod page;

pub use cursor::CursorPager;
pub use factory::build_pager;
pub use graphql_cursor::GraphqlCursorPager;
pub use link::LinkPager;
pub use offset::OffsetPager;
pub use page::PagePager;

use crate::error::SiphonError;
use crate::request::PendingRequest;
use crate::transport::RawResponse;
use serde_json::Value;

/// Drives successive requests for one paginated extraction.
///
/// `next_request` returns the request to issue, or `None` once pagination
/// is complete — including the very first call, which always returns the
/// first page's request. `update_state` is called once per page with the
/// request that produced it, the raw response, and the decoded body.
pub trait Pager: Send + Sync {
    fn next_request(&self, base: &PendingRequest) -> Option<PendingRequest>;

    /// # Errors
    ///
    /// Returns [`SiphonError::Pagination`] only for structurally unusable
    /// responses; missing or malformed pagination fields terminate the
    /// loop rather than erroring (see spec §4.3's per-pager boundary
    /// rules).
    fn update_state(
        &self,
        request: &PendingRequest,
        response: &RawResponse,
        body: &Value,
    ) -> Result<(), SiphonError>;
}

/// Fallback used by page/offset pagers when neither a total-count path nor
/// a has-more path is configured: inspect the top-level `data` field and
/// treat a non-empty array as "more pages remain".
fn data_field_non_empty(body: &Value) -> bool {
    let (value, found) = crate::value::evaluate(body, "data");
    found
        && value
            .as_ref()
            .and_then(Value::as_array)
            .is_some_and(|arr| !arr.is_empty())
}
