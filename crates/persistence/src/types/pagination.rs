//! Pagination types.
//!
//! Continuation tokens are plain decimal offsets into the backend result set.
//! A token is only meaningful for the filter set and page size that produced it.

use crate::error::ValidationError;

/// Page size used when the caller asks for "no limit".
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Parses a continuation token into an offset. A missing or empty token is 0.
pub fn parse_continue_token(token: Option<&str>) -> Result<u64, ValidationError> {
    match token.map(str::trim) {
        None | Some("") => Ok(0),
        Some(t) => t
            .parse::<u64>()
            .map_err(|_| ValidationError::InvalidContinueToken {
                token: t.to_string(),
            }),
    }
}

/// One page of list results.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    /// Decoded objects, in backend order.
    pub items: Vec<T>,
    /// Token for the next page; `None` when this page is assumed to be the last.
    pub continue_token: Option<String>,
    /// Documents matching the query beyond this page.
    pub remaining_item_count: Option<u64>,
}

impl<T> ListPage<T> {
    /// Builds a page from the raw search outcome.
    ///
    /// A next-page token is produced only when the page is exactly full, so a
    /// result set whose size is a multiple of `limit` ends with one empty page.
    /// A zero `limit` never produces a token.
    pub fn from_search(
        items: Vec<T>,
        offset: u64,
        limit: Option<u32>,
        with_continue: bool,
        total: u64,
    ) -> Self {
        let returned = items.len() as u64;
        let continue_token = match limit {
            Some(limit) if limit > 0 && with_continue && returned == u64::from(limit) => {
                Some((offset + u64::from(limit)).to_string())
            }
            _ => None,
        };
        Self {
            items,
            continue_token,
            remaining_item_count: Some(total.saturating_sub(offset).saturating_sub(returned)),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
