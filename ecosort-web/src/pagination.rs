//! Pagination utilities for the history views

/// Records per history page
pub const HISTORY_PAGE_SIZE: i64 = 8;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Offset for SQL LIMIT/OFFSET query
    pub offset: i64,
}

/// Number of pages needed for `total` rows, `ceil(total / page_size)`
///
/// `page_size` must be positive.
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    (total + page_size - 1) / page_size
}

/// Calculate pagination metadata from total results and requested page
///
/// Clamps the page into `[1, total_pages]` (page 1 when there are no rows).
///
/// # Examples
/// ```
/// use ecosort_web::pagination::calculate_pagination;
///
/// // 17 records at 8 per page = 3 pages (8 + 8 + 1)
/// let p = calculate_pagination(17, 3, 8);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 16);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(17, 99, 8);
/// assert_eq!(p.page, 3);
/// ```
pub fn calculate_pagination(total_results: i64, requested_page: i64, page_size: i64) -> Pagination {
    let total_pages = total_pages(total_results, page_size);
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * page_size;

    Pagination {
        page,
        total_pages,
        offset,
    }
}
