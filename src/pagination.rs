use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;
/// Keeps `offset()` within the signed 64-bit range the database binds.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_LIMIT;

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// A validated page window. `page` is 1-based.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Page {
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1).min(MAX_PAGE);
        let limit = limit.filter(|l| *l >= 1).unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl From<PageQuery> for Page {
    fn from(q: PageQuery) -> Self {
        Self::new(q.page, q.limit)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_movies: u64,
    pub movies_per_page: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: Page, total: u64) -> Self {
        let total_pages = total.div_ceil(page.limit);
        Self {
            current_page: page.page,
            total_pages,
            total_movies: total,
            movies_per_page: page.limit,
            has_next_page: page.page < total_pages,
            has_prev_page: page.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        assert_eq!(Page::new(None, None), Page { page: 1, limit: DEFAULT_LIMIT });
        assert_eq!(Page::new(Some(0), Some(0)), Page { page: 1, limit: DEFAULT_LIMIT });
        assert_eq!(Page::new(Some(3), Some(500)), Page { page: 3, limit: MAX_LIMIT });
        assert_eq!(Page::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn huge_page_offset_fits_in_i64() {
        let page = Page::new(Some(u64::MAX), Some(MAX_LIMIT));
        assert_eq!(page.page, MAX_PAGE);
        assert!(i64::try_from(page.offset()).is_ok());
    }

    #[test]
    fn total_pages_is_ceiling_division() {
        for (total, limit, expected) in [(0, 20, 0), (1, 20, 1), (20, 20, 1), (21, 20, 2), (95, 10, 10)] {
            let p = Pagination::new(Page::new(Some(1), Some(limit)), total);
            assert_eq!(p.total_pages, expected, "total={total} limit={limit}");
        }
    }

    #[test]
    fn next_and_prev_flags_follow_current_page() {
        let first = Pagination::new(Page::new(Some(1), Some(10)), 25);
        assert!(first.has_next_page);
        assert!(!first.has_prev_page);

        let last = Pagination::new(Page::new(Some(3), Some(10)), 25);
        assert!(!last.has_next_page);
        assert!(last.has_prev_page);

        let past_end = Pagination::new(Page::new(Some(9), Some(10)), 25);
        assert!(!past_end.has_next_page);
        assert!(past_end.has_prev_page);
    }

    #[test]
    fn serializes_camel_case() {
        let p = Pagination::new(Page::new(Some(2), Some(5)), 12);
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["currentPage"], 2);
        assert_eq!(v["totalPages"], 3);
        assert_eq!(v["totalMovies"], 12);
        assert_eq!(v["moviesPerPage"], 5);
        assert_eq!(v["hasNextPage"], true);
        assert_eq!(v["hasPrevPage"], true);
    }
}
