//! Bounded page retrieval shared by every listing.
//!
//! Filtering always happens before slicing: callers hand in the already
//! filtered sequence and `paginate` computes the total over all of it.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on rows per page.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Page parameters (1-based page number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Validate raw paging input. Missing values fall back to defaults, the
    /// page size is capped at `MAX_PAGE_SIZE`.
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> DomainResult<Self> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page == 0 {
            return Err(DomainError::validation("page must be >= 1"));
        }
        if page_size == 0 {
            return Err(DomainError::validation("page size must be >= 1"));
        }

        Ok(Self {
            page,
            page_size: page_size.min(MAX_PAGE_SIZE),
        })
    }

    /// Index of the first row of this page within the filtered set.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.page_size as usize)
    }
}

/// One page of a filtered result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of rows matching the filter across all pages.
    pub total_matching: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Assemble a page from rows a backend has already sliced.
    pub fn new(items: Vec<T>, total_matching: u64, request: PageRequest) -> Self {
        let total_pages = total_matching.div_ceil(u64::from(request.page_size)) as u32;
        let has_more = (request.offset() as u64).saturating_add(items.len() as u64) < total_matching;

        Page {
            items,
            total_matching,
            page: request.page,
            page_size: request.page_size,
            total_pages,
            has_more,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_matching: self.total_matching,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            has_more: self.has_more,
        }
    }
}

/// Slice rows `[(page-1)*size, page*size)` out of an already filtered sequence.
pub fn paginate<T>(filtered: impl IntoIterator<Item = T>, request: PageRequest) -> Page<T> {
    let offset = request.offset();
    let size = request.page_size as usize;

    let mut total: u64 = 0;
    let mut items = Vec::with_capacity(size.min(64));
    for (idx, row) in filtered.into_iter().enumerate() {
        total += 1;
        if idx >= offset && items.len() < size {
            items.push(row);
        }
    }

    Page::new(items, total, request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn page_request_rejects_zero_values() {
        assert!(PageRequest::new(Some(0), None).is_err());
        assert!(PageRequest::new(None, Some(0)).is_err());
    }

    #[test]
    fn page_request_caps_size_and_defaults() {
        let req = PageRequest::new(None, Some(50_000)).unwrap();
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(None, None).unwrap(), PageRequest::default());
    }

    #[test]
    fn page_past_the_end_is_empty_but_counts_everything() {
        let page = paginate(0..25, PageRequest::new(Some(4), Some(10)).unwrap());
        assert!(page.items.is_empty());
        assert_eq!(page.total_matching, 25);
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_more);
    }

    #[test]
    fn middle_page_reports_more() {
        let page = paginate(0..25, PageRequest::new(Some(2), Some(10)).unwrap());
        assert_eq!(page.items, (10..20).collect::<Vec<_>>());
        assert!(page.has_more);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: walking every page yields the whole set, in order, and the
        /// page sizes sum to `total_matching`.
        #[test]
        fn pages_partition_the_filtered_set(len in 0usize..200, size in 1u32..40) {
            let rows: Vec<usize> = (0..len).collect();
            let first = paginate(rows.clone(), PageRequest::new(Some(1), Some(size)).unwrap());
            let mut seen = Vec::new();
            for k in 1..=first.total_pages.max(1) {
                let page = paginate(rows.clone(), PageRequest::new(Some(k), Some(size)).unwrap());
                prop_assert_eq!(page.total_matching, len as u64);
                let start = (k as usize - 1) * size as usize;
                let end = (start + size as usize).min(len);
                prop_assert_eq!(&page.items[..], &rows[start.min(len)..end]);
                seen.extend(page.items);
            }
            prop_assert_eq!(seen, rows);
        }
    }
}
