//! Offset/limit paging primitives for list endpoints.
//!
//! Clients address pages by a one-based page number and a page size. Both
//! are optional on the wire; [`PageRequest::from_parts`] applies the defaults
//! (page 1, size 10) and rejects values outside the accepted range.
//! Persistence adapters consume [`PageRequest::offset`] and
//! [`PageRequest::limit`]; handlers return [`Page`] to callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page number used when the client omits one.
pub const DEFAULT_PAGE_NUMBER: u32 = 1;
/// Page size used when the client omits one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Errors raised while validating paging parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// The page number was zero or negative.
    #[error("page number must be at least 1, got {0}")]
    InvalidPageNumber(i64),
    /// The page size was zero, negative or above [`MAX_PAGE_SIZE`].
    #[error("page size must be between 1 and {MAX_PAGE_SIZE}, got {0}")]
    InvalidPageSize(i64),
}

/// Validated one-based page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page_number: u32,
    page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: DEFAULT_PAGE_NUMBER,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build a page request from optional wire values, applying defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when a supplied value is out of range.
    ///
    /// # Examples
    /// ```
    /// use pagination::PageRequest;
    ///
    /// let page = PageRequest::from_parts(None, Some(25)).expect("valid page");
    /// assert_eq!(page.page_number(), 1);
    /// assert_eq!(page.offset(), 0);
    /// assert_eq!(page.limit(), 25);
    /// ```
    pub fn from_parts(
        page_number: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Self, PageRequestError> {
        let number = match page_number {
            None => DEFAULT_PAGE_NUMBER,
            Some(value) => u32::try_from(value)
                .ok()
                .filter(|n| *n >= 1)
                .ok_or(PageRequestError::InvalidPageNumber(value))?,
        };
        let size = match page_size {
            None => DEFAULT_PAGE_SIZE,
            Some(value) => u32::try_from(value)
                .ok()
                .filter(|n| (1..=MAX_PAGE_SIZE).contains(n))
                .ok_or(PageRequestError::InvalidPageSize(value))?,
        };
        Ok(Self {
            page_number: number,
            page_size: size,
        })
    }

    /// One-based page number.
    #[must_use]
    pub const fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Number of items per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of rows to skip before this page starts.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page_number.saturating_sub(1)) * i64::from(self.page_size)
    }

    /// Maximum number of rows in this page.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

/// A single page of results together with the total item count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page, in stable order.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: i64,
    /// Coordinates this page was produced for.
    pub request: PageRequest,
}

impl<T> Page<T> {
    /// Assemble a page from the items and total produced by a query.
    #[must_use]
    pub const fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            request,
        }
    }

    /// Whether another page follows this one.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.request.offset() + self.request.limit() < self.total
    }

    /// Transform each item while keeping the paging metadata.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Paging defaults and bounds.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_apply_when_parts_are_absent() {
        let page = PageRequest::from_parts(None, None).expect("defaults are valid");
        assert_eq!(page, PageRequest::default());
        assert_eq!(page.page_number(), DEFAULT_PAGE_NUMBER);
        assert_eq!(page.page_size(), DEFAULT_PAGE_SIZE);
    }

    #[rstest]
    #[case(Some(1), Some(10), 0, 10)]
    #[case(Some(3), Some(10), 20, 10)]
    #[case(Some(2), None, 10, 10)]
    #[case(None, Some(50), 0, 50)]
    fn offset_and_limit_follow_page_coordinates(
        #[case] number: Option<i64>,
        #[case] size: Option<i64>,
        #[case] offset: i64,
        #[case] limit: i64,
    ) {
        let page = PageRequest::from_parts(number, size).expect("valid page");
        assert_eq!(page.offset(), offset);
        assert_eq!(page.limit(), limit);
    }

    #[rstest]
    #[case(Some(0), None, PageRequestError::InvalidPageNumber(0))]
    #[case(Some(-4), None, PageRequestError::InvalidPageNumber(-4))]
    #[case(None, Some(0), PageRequestError::InvalidPageSize(0))]
    #[case(None, Some(201), PageRequestError::InvalidPageSize(201))]
    fn rejects_out_of_range_values(
        #[case] number: Option<i64>,
        #[case] size: Option<i64>,
        #[case] expected: PageRequestError,
    ) {
        assert_eq!(PageRequest::from_parts(number, size), Err(expected));
    }

    #[rstest]
    fn has_more_reports_remaining_items() {
        let request = PageRequest::from_parts(Some(1), Some(2)).expect("valid page");
        let page = Page::new(vec![1, 2], 3, request);
        assert!(page.has_more());
        let last = Page::new(vec![3], 3, PageRequest::from_parts(Some(2), Some(2)).expect("valid"));
        assert!(!last.has_more());
    }

    #[rstest]
    fn map_preserves_metadata() {
        let page = Page::new(vec![1, 2], 2, PageRequest::default()).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.total, 2);
    }
}
