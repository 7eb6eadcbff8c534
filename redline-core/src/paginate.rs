//! Fixed-size paging of an ordered sequence.
//!
//! Page numbers are 1-indexed and clamped into `[1, max(1, total_pages)]`, so a
//! request past either end lands on the first or last page instead of failing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page_number: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page_number: self.page_number,
            page_size: self.page_size,
            total_pages: self.total_pages,
            total_items: self.total_items,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

/// Slice `items` into the requested page. A zero page size is treated as 1.
pub fn paginate<T>(items: Vec<T>, page_number: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let page_number = page_number.clamp(1, total_pages.max(1));

    let start = (page_number - 1) * page_size;
    let items: Vec<T> = items.into_iter().skip(start).take(page_size).collect();

    Page {
        page_number,
        page_size,
        total_pages,
        total_items,
        items,
    }
}

/// Which dashboard view a query feeds; decides the default page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Prompt and image galleries.
    Gallery,
    /// Tabular record lists.
    #[default]
    List,
}

/// One entry of a pager control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "page", rename_all = "snake_case")]
pub enum PageLink {
    Page(usize),
    Ellipsis,
}

/// Pager entries: first, last, and the current page with its neighbours.
/// Each skipped run collapses into a single ellipsis.
pub fn page_links(current: usize, total_pages: usize) -> Vec<PageLink> {
    if total_pages == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, total_pages);
    let mut links = Vec::new();
    for page in 1..=total_pages {
        let near_current = page + 1 >= current && page <= current + 1;
        if page == 1 || page == total_pages || near_current {
            links.push(PageLink::Page(page));
        } else if links.last() != Some(&PageLink::Ellipsis) {
            links.push(PageLink::Ellipsis);
        }
    }
    links
}
