//! Offset pagination for feed listings and search.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 50;

/// Normalized `page` / `limit` pair. `index` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub index: u64,
    pub limit: u64,
}

impl PageRequest {
    /// `page` is 1-based and floored to 1; `limit` defaults to 20 and is
    /// capped at 50.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.filter(|page| *page > 0).unwrap_or(1);
        let limit = limit
            .filter(|limit| *limit > 0)
            .map(|limit| (limit as u64).min(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT);
        Self {
            index: (page - 1) as u64,
            limit,
        }
    }

    /// Row offset, clamped so it always fits a signed 64-bit bind.
    pub fn offset(&self) -> u64 {
        self.index.saturating_mul(self.limit).min(i64::MAX as u64)
    }

    /// One extra row reveals whether a next page exists.
    pub fn fetch_limit(&self) -> u64 {
        self.limit + 1
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage<T> {
    pub size: u64,
    pub data: Vec<T>,
    pub has_next: bool,
}

impl<T> FeedPage<T> {
    pub fn empty() -> Self {
        Self {
            size: 0,
            data: Vec::new(),
            has_next: false,
        }
    }

    /// Builds a page from rows fetched with [`PageRequest::fetch_limit`].
    pub fn from_overfetched(size: u64, mut rows: Vec<T>, page: PageRequest) -> Self {
        let has_next = rows.len() as u64 > page.limit;
        if has_next {
            rows.truncate(page.limit as usize);
        }
        Self {
            size,
            data: rows,
            has_next,
        }
    }

    /// Slices an in-memory result set.
    pub fn slice(mut all: Vec<T>, page: PageRequest) -> Self {
        let size = all.len() as u64;
        let start = page.offset().min(size) as usize;
        let end = page.offset().saturating_add(page.limit).min(size) as usize;
        let has_next = (end as u64) < size;
        let data = all.drain(start..end).collect();
        Self {
            size,
            data,
            has_next,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> FeedPage<U> {
        FeedPage {
            size: self.size,
            data: self.data.into_iter().map(f).collect(),
            has_next: self.has_next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_twenty() {
        let page = PageRequest::new(None, None);
        assert_eq!(page, PageRequest { index: 0, limit: 20 });
    }

    #[test]
    fn non_positive_values_are_normalized() {
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest::default());
        assert_eq!(PageRequest::new(Some(-3), Some(-1)), PageRequest::default());
    }

    #[test]
    fn limit_is_capped() {
        let page = PageRequest::new(Some(3), Some(500));
        assert_eq!(page.limit, 50);
        assert_eq!(page.offset(), 100);
        assert_eq!(page.fetch_limit(), 51);
    }

    #[test]
    fn huge_pages_clamp_the_offset() {
        let page = PageRequest::new(Some(i64::MAX), Some(50));
        assert_eq!(page.offset(), i64::MAX as u64);
        assert!(FeedPage::slice(vec![1, 2, 3], page).data.is_empty());
    }

    #[test]
    fn overfetched_extra_row_marks_next_page() {
        let page = PageRequest::new(Some(1), Some(20));
        let result = FeedPage::from_overfetched(21, (0..21).collect::<Vec<_>>(), page);
        assert!(result.has_next);
        assert_eq!(result.data.len(), 20);
        assert_eq!(result.size, 21);
    }

    #[test]
    fn exact_page_has_no_next() {
        let page = PageRequest::new(Some(1), Some(20));
        let result = FeedPage::from_overfetched(20, (0..20).collect::<Vec<_>>(), page);
        assert!(!result.has_next);
        assert_eq!(result.data.len(), 20);
    }

    #[test]
    fn slice_reports_remaining_hits() {
        let all: Vec<u32> = (0..45).collect();
        let first = FeedPage::slice(all.clone(), PageRequest::new(Some(1), Some(20)));
        assert_eq!(first.data.first(), Some(&0));
        assert!(first.has_next);

        let last = FeedPage::slice(all.clone(), PageRequest::new(Some(3), Some(20)));
        assert_eq!(last.data, vec![40, 41, 42, 43, 44]);
        assert!(!last.has_next);
        assert_eq!(last.size, 45);

        let beyond = FeedPage::slice(all, PageRequest::new(Some(9), Some(20)));
        assert!(beyond.data.is_empty());
        assert!(!beyond.has_next);
        assert_eq!(beyond.size, 45);
    }
}
