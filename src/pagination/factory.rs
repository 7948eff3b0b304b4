//! Builds a [`Pager`] trait object from a validated [`PaginationSpec`].

use super::{CursorPager, GraphqlCursorPager, LinkPager, OffsetPager, Pager, PagePager};
use crate::config::PaginationSpec;

#[must_use]
pub fn build_pager(spec: &PaginationSpec) -> Box<dyn Pager> {
    match spec {
        PaginationSpec::Page(config) => Box::new(PagePager::new(config)),
        PaginationSpec::Offset(config) => Box::new(OffsetPager::new(config)),
        PaginationSpec::Cursor(config) => Box::new(CursorPager::new(config)),
        PaginationSpec::Link => Box::new(LinkPager::new()),
        PaginationSpec::GraphqlCursor(config) => Box::new(GraphqlCursorPager::new(config)),
    }
}
