use serde::Serialize;

use crate::ValidationError;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// 1-based page selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    page_size: usize,
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Result<Self, ValidationError> {
        if page == 0 {
            return Err(ValidationError::ZeroPage);
        }
        if page_size == 0 {
            return Err(ValidationError::ZeroPageSize);
        }
        Ok(Self { page, page_size })
    }

    /// Page `page` at the default page size.
    pub fn page(page: usize) -> Result<Self, ValidationError> {
        Self::new(page, DEFAULT_PAGE_SIZE)
    }

    pub const fn first() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub const fn index(self) -> usize {
        self.page
    }

    pub const fn size(self) -> usize {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total: usize,
}

/// Slices one page out of `items`. A page past the end is empty.
pub fn paginate<T: Clone>(items: &[T], request: PageRequest) -> Page<T> {
    let total = items.len();
    let start = (request.page - 1).saturating_mul(request.page_size).min(total);
    let end = start.saturating_add(request.page_size).min(total);

    Page {
        items: items[start..end].to_vec(),
        page: request.page,
        page_size: request.page_size,
        page_count: total.div_ceil(request.page_size),
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_three_items_make_three_pages() {
        let items: Vec<usize> = (0..23).collect();

        let first = paginate(&items, PageRequest::page(1).expect("valid"));
        let last = paginate(&items, PageRequest::page(3).expect("valid"));

        assert_eq!(first.items.len(), 10);
        assert_eq!(first.page_count, 3);
        assert_eq!(last.items, vec![20, 21, 22]);
        assert_eq!(last.total, 23);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let items = vec!['a', 'b'];
        let page = paginate(&items, PageRequest::page(4).expect("valid"));

        assert!(page.items.is_empty());
        assert_eq!(page.page_count, 1);
    }

    #[test]
    fn no_items_means_no_pages() {
        let page = paginate::<u8>(&[], PageRequest::first());
        assert_eq!(page.page_count, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn zero_page_and_zero_size_are_rejected() {
        assert_eq!(PageRequest::new(0, 10), Err(ValidationError::ZeroPage));
        assert_eq!(PageRequest::new(1, 0), Err(ValidationError::ZeroPageSize));
    }
}
