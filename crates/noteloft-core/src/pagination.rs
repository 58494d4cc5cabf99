//! Pagination types and helpers.

use serde::{Deserialize, Serialize};

/// Sort direction accepted by list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A page of results with total counts, shared by every list endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedData<T> {
    pub total: i64,
    pub data: Vec<T>,
    pub page: i64,
    pub next_page: i64,
    pub pages: i64,
    pub limit: i64,
}

/// Number of pages needed for `total` items at `page_size` per page.
pub fn calc_num_pages(total: i64, page_size: i64) -> i64 {
    if page_size <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

/// Paginate an in-memory collection. Page numbers are clamped to valid
/// bounds rather than rejected.
pub fn paginate<T>(items: Vec<T>, page: i64, page_size: i64) -> PaginatedData<T> {
    let total = items.len() as i64;
    let pages = calc_num_pages(total, page_size);
    let current = page.clamp(1, pages.max(1));

    let start = ((current - 1) * page_size) as usize;
    let data: Vec<T> = items
        .into_iter()
        .skip(start)
        .take(page_size.max(0) as usize)
        .collect();

    PaginatedData {
        total,
        data,
        page: current,
        next_page: current + 1,
        pages,
        limit: page_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_parses_lowercase() {
        let order: SortOrder = serde_json::from_value(serde_json::json!("desc")).expect("parse");
        assert_eq!(order, SortOrder::Desc);
        assert_eq!(order.as_sql(), "DESC");
    }

    #[test]
    fn test_calc_num_pages() {
        assert_eq!(calc_num_pages(0, 10), 0);
        assert_eq!(calc_num_pages(1, 10), 1);
        assert_eq!(calc_num_pages(10, 10), 1);
        assert_eq!(calc_num_pages(11, 10), 2);
    }

    #[test]
    fn test_paginate_middle_page() {
        let page = paginate((1..=25).collect::<Vec<_>>(), 2, 10);
        assert_eq!(page.total, 25);
        assert_eq!(page.data, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.page, 2);
        assert_eq!(page.next_page, 3);
        assert_eq!(page.pages, 3);
    }

    #[test]
    fn test_paginate_clamps_out_of_range_page() {
        let page = paginate((1..=5).collect::<Vec<_>>(), 9, 10);
        assert_eq!(page.page, 1);
        assert_eq!(page.data.len(), 5);

        let page = paginate(Vec::<i32>::new(), 0, 10);
        assert_eq!(page.page, 1);
        assert!(page.data.is_empty());
    }
}
