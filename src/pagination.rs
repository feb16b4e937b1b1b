use serde::Deserialize;
use utoipa::IntoParams;

pub const MAX_PAGE_SIZE: u64 = 100;

/// Query parameters accepted by every paginated listing
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 1-based page number
    pub page: Option<u64>,
    /// Number of items per page (capped at 100)
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn from_params(params: &PageParams, default_size: u64) -> Self {
        Self::new(
            params.page.unwrap_or(1),
            params.page_size.unwrap_or(default_size),
        )
    }

    /// Rows to skip, saturated so it still fits a Postgres BIGINT OFFSET
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.page_size)
            .min(i64::MAX as u64)
    }
}

/// One page of materialized results plus the total row count
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            (self.total + self.page_size - 1) / self.page_size
        }
    }

    pub fn map<U, F>(self, f: F) -> Paginated<U>
    where
        F: FnMut(T) -> U,
    {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Slice an already ordered collection, used by the in-memory store
pub fn slice_page<T: Clone>(rows: &[T], request: PageRequest) -> Vec<T> {
    rows.iter()
        .skip(request.offset() as usize)
        .take(request.page_size as usize)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamping() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, 1);

        let request = PageRequest::new(3, 1000);
        assert_eq!(request.page_size, MAX_PAGE_SIZE);
        assert_eq!(request.offset(), 200);
    }

    #[test]
    fn test_defaults_from_params() {
        let request = PageRequest::from_params(&PageParams::default(), 20);
        assert_eq!(request, PageRequest::new(1, 20));
    }

    #[test]
    fn test_total_pages() {
        let request = PageRequest::new(1, 10);
        assert_eq!(Paginated::<u8>::new(vec![], 0, request).total_pages(), 0);
        assert_eq!(Paginated::<u8>::new(vec![], 10, request).total_pages(), 1);
        assert_eq!(Paginated::<u8>::new(vec![], 11, request).total_pages(), 2);
    }

    #[test]
    fn test_slice_page() {
        let rows: Vec<u32> = (1..=25).collect();
        assert_eq!(slice_page(&rows, PageRequest::new(3, 10)), vec![21, 22, 23, 24, 25]);
        assert!(slice_page(&rows, PageRequest::new(4, 10)).is_empty());
    }

    #[test]
    fn test_huge_page_yields_empty_slice() {
        let request = PageRequest::new(u64::MAX, MAX_PAGE_SIZE);
        assert_eq!(request.offset(), i64::MAX as u64);

        let rows: Vec<u32> = (1..=25).collect();
        assert!(slice_page(&rows, request).is_empty());
    }
}
