//! Lenient page-number pagination.
//!
//! A page request never fails: values that are not integers select the first
//! page and numbers past either end clamp to the nearest valid page. An empty
//! result set still has one (empty) page.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    per_page: u32,
}

/// One resolved page of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    /// 1-based page number.
    pub number: u32,
    pub num_pages: u32,
    pub total_count: u64,
    pub per_page: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Paginator {
    /// `per_page` of zero is treated as one.
    #[must_use]
    pub fn new(count: u64, per_page: u32) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    #[must_use]
    pub fn num_pages(&self) -> u32 {
        let pages = self.count.div_ceil(u64::from(self.per_page)).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Resolve a raw `page` query value.
    #[must_use]
    pub fn page(&self, raw: Option<&str>) -> Page {
        let requested = raw.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(1);
        self.page_number(requested)
    }

    #[must_use]
    pub fn page_number(&self, requested: i64) -> Page {
        let num_pages = self.num_pages();
        let number = if requested < 1 {
            1
        } else {
            u32::try_from(requested).map_or(num_pages, |n| n.min(num_pages))
        };

        Page {
            number,
            num_pages,
            total_count: self.count,
            per_page: self.per_page,
            has_previous: number > 1,
            has_next: number < num_pages,
        }
    }
}

impl Page {
    /// Rows to skip before this page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.per_page)
    }

    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_has_one_page() {
        let page = Paginator::new(0, 12).page(None);
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(!page.has_next);
        assert!(!page.has_previous);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_page_count_rounds_up() {
        assert_eq!(Paginator::new(12, 12).num_pages(), 1);
        assert_eq!(Paginator::new(13, 12).num_pages(), 2);
        assert_eq!(Paginator::new(25, 12).num_pages(), 3);
    }

    #[test]
    fn test_non_integer_selects_first_page() {
        let paginator = Paginator::new(40, 12);
        assert_eq!(paginator.page(Some("abc")).number, 1);
        assert_eq!(paginator.page(Some("")).number, 1);
        assert_eq!(paginator.page(Some("2.5")).number, 1);
    }

    #[test]
    fn test_out_of_range_clamps() {
        let paginator = Paginator::new(40, 12);
        let last = paginator.page(Some("99"));
        assert_eq!(last.number, 4);
        assert_eq!(last.offset(), 36);
        assert!(!last.has_next);
        assert!(last.has_previous);

        assert_eq!(paginator.page(Some("0")).number, 1);
        assert_eq!(paginator.page(Some("-3")).number, 1);
        assert_eq!(paginator.page(Some("99999999999999")).number, 4);
    }

    #[test]
    fn test_middle_page() {
        let page = Paginator::new(40, 12).page(Some(" 2 "));
        assert_eq!(page.number, 2);
        assert_eq!(page.offset(), 12);
        assert_eq!(page.limit(), 12);
        assert!(page.has_next && page.has_previous);
    }
}
