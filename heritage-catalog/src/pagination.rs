//! Page window arithmetic.
//!
//! Out-of-range input is clamped, never rejected.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const MAX_PER_PAGE: u32 = 100;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    pub fn new(page: i64, per_page: i64) -> Self {
        PageRequest {
            page: page.clamp(1, i64::from(u32::MAX)) as u32,
            per_page: per_page.clamp(1, i64::from(MAX_PER_PAGE)) as u32,
        }
    }

    /// Build a request from raw query parameters.
    ///
    /// Absent or non-integer values fall back to page 1 and `default_per_page`.
    pub fn parse(page: Option<&str>, per_page: Option<&str>, default_per_page: u32) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|s| s.trim().parse::<i64>().ok());
        Self::new(
            parse(page).unwrap_or(i64::from(DEFAULT_PAGE)),
            parse(per_page).unwrap_or(i64::from(default_per_page)),
        )
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Number of rows before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u32 {
        self.per_page
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: DEFAULT_PAGE,
            per_page: 10,
        }
    }
}

/// Number of pages for `total` rows; an empty result still has one page.
pub fn page_count(total: u64, per_page: u32) -> u64 {
    total.div_ceil(u64::from(per_page.max(1))).max(1)
}

/// One page of an ordered result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub pages: u64,
}

impl<T> Page<T> {
    /// Assemble a page from a window the store already cut.
    pub fn from_window(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Page {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
            pages: page_count(total, request.per_page),
        }
    }
}

/// Slice an in-memory ordered sequence.
///
/// Store-backed pages are cut in SQL and assembled with [`Page::from_window`].
pub fn paginate<T>(ordered: Vec<T>, request: PageRequest) -> Page<T> {
    let total = ordered.len() as u64;
    let items = ordered
        .into_iter()
        .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
        .take(request.per_page as usize)
        .collect();
    Page::from_window(items, total, request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heritage_utils_test::arb_page_param;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, 1, 10)]
    #[case(Some("abc"), Some("xyz"), 1, 10)]
    #[case(Some("0"), Some("0"), 1, 1)]
    #[case(Some("-3"), Some("-1"), 1, 1)]
    #[case(Some("2"), Some("500"), 2, 100)]
    #[case(Some(" 3 "), Some("25"), 3, 25)]
    fn test_parse_clamps(
        #[case] page: Option<&str>,
        #[case] per_page: Option<&str>,
        #[case] expected_page: u32,
        #[case] expected_per_page: u32,
    ) {
        let request = PageRequest::parse(page, per_page, 10);
        assert_eq!(request.page(), expected_page);
        assert_eq!(request.per_page(), expected_per_page);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 25).offset(), 50);
    }

    #[test]
    fn test_empty_result_has_one_page() {
        let page = paginate(Vec::<u32>::new(), PageRequest::default());
        assert_eq!(page.pages, 1);
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_page_past_end() {
        let page = paginate((1..=25).collect(), PageRequest::new(4, 10));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 25);
        assert_eq!(page.pages, 3);
        assert_eq!(page.page, 4);
    }

    #[test]
    fn test_last_partial_page() {
        let page = paginate((1..=25).collect::<Vec<u32>>(), PageRequest::new(3, 10));
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
    }

    proptest! {
        #[test]
        fn page_window_bounds(
            total in 0usize..400,
            page in arb_page_param(),
            per_page in arb_page_param(),
        ) {
            let request = PageRequest::parse(page.as_deref(), per_page.as_deref(), 10);
            prop_assert!(request.page() >= 1);
            prop_assert!((1..=MAX_PER_PAGE).contains(&request.per_page()));

            let result = paginate((0..total).collect(), request);
            prop_assert!(result.items.len() <= result.per_page as usize);
            prop_assert_eq!(result.total, total as u64);
            prop_assert_eq!(
                result.pages,
                std::cmp::max(1, (total as u64).div_ceil(u64::from(result.per_page)))
            );
            if u64::from(result.page) > result.pages {
                prop_assert!(result.items.is_empty());
            }
            for pair in result.items.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
        }

        #[test]
        fn pages_partition_the_sequence(total in 0usize..120, per_page in 1i64..=30) {
            let ordered: Vec<usize> = (0..total).collect();
            let pages = page_count(total as u64, per_page as u32);
            let mut seen = Vec::new();
            for page in 1..=pages as i64 {
                seen.extend(paginate(ordered.clone(), PageRequest::new(page, per_page)).items);
            }
            prop_assert_eq!(seen, ordered);
        }
    }
}
