//! Page arithmetic shared by every paginated list.

use serde::{Deserialize, Serialize};

/// Pagination block of a list envelope. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl Pagination {
    /// Build a pagination block; a zero page or limit is treated as 1.
    pub fn new(total: u64, page: u64, limit: u64) -> Self {
        let limit = limit.max(1);
        Self {
            total,
            page: page.max(1),
            limit,
            total_pages: total.div_ceil(limit),
        }
    }

    /// Zero-based index of the first item on this page.
    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1).saturating_mul(self.limit)
    }

    /// Number of items on this page.
    pub fn items_on_page(&self) -> u64 {
        self.total.saturating_sub(self.offset()).min(self.limit.max(1))
    }

    /// "Showing 21 to 25 of 25"; "Showing 0 to 0 of 0" when there is nothing
    /// on the page.
    pub fn showing_label(&self) -> String {
        let count = self.items_on_page();
        if count == 0 {
            return format!("Showing 0 to 0 of {}", self.total);
        }
        let first = self.offset() + 1;
        let last = self.offset() + count;
        format!("Showing {} to {} of {}", first, last, self.total)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Slice `items` to a 1-based page of `limit` items.
pub fn paginate<T>(items: &[T], page: u64, limit: u64) -> (&[T], Pagination) {
    let pagination = Pagination::new(items.len() as u64, page, limit);
    let start = usize::try_from(pagination.offset())
        .unwrap_or(usize::MAX)
        .min(items.len());
    let end = start
        .saturating_add(pagination.items_on_page() as usize)
        .min(items.len());
    (&items[start..end], pagination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_partial_page() {
        let items: Vec<u32> = (1..=25).collect();
        let (page, pagination) = paginate(&items, 3, 10);
        assert_eq!(page, &[21, 22, 23, 24, 25]);
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(pagination.showing_label(), "Showing 21 to 25 of 25");
        assert!(!pagination.has_next());
        assert!(pagination.has_prev());
    }

    #[test]
    fn test_first_page() {
        let items: Vec<u32> = (1..=25).collect();
        let (page, pagination) = paginate(&items, 1, 10);
        assert_eq!(page.len(), 10);
        assert_eq!(pagination.showing_label(), "Showing 1 to 10 of 25");
        assert!(pagination.has_next());
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let items: Vec<u32> = (1..=25).collect();
        let (page, pagination) = paginate(&items, 4, 10);
        assert!(page.is_empty());
        assert_eq!(pagination.showing_label(), "Showing 0 to 0 of 25");
    }

    #[test]
    fn test_empty_list() {
        let items: Vec<u32> = Vec::new();
        let (page, pagination) = paginate(&items, 1, 10);
        assert!(page.is_empty());
        assert_eq!(pagination.total_pages, 0);
        assert_eq!(pagination.showing_label(), "Showing 0 to 0 of 0");
    }

    #[test]
    fn test_zero_limit_and_page_are_clamped() {
        let pagination = Pagination::new(3, 0, 0);
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, 1);
        assert_eq!(pagination.total_pages, 3);
    }
}
