//! Pagination types for large result sets.
//!
//! [`PaginationParams`] names a page of a result set; [`Page`] carries that
//! page's items together with navigation metadata. Backends that can push
//! limits down use [`PaginationParams::offset`] directly; in-memory callers
//! can slice an already-materialized vector with [`PaginationParams::paginate`].

use serde::{Deserialize, Serialize};
use std::cmp::min;

/// A single page of paginated results.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The items contained in this page.
    pub items: Vec<T>,
    /// Total count of items across all pages.
    pub count: usize,
    /// The next page number, if more pages exist.
    pub next_page: Option<usize>,
    /// The previous page number, if this is not the first page.
    pub previous_page: Option<usize>,
}

impl<T> Page<T> {
    /// An empty page of an empty result set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Maps the page items through `f`, keeping navigation metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            next_page: self.next_page,
            previous_page: self.previous_page,
        }
    }

    /// Maps the page items through a fallible `f`, keeping navigation metadata.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self
                .items
                .into_iter()
                .map(f)
                .collect::<Result<Vec<_>, E>>()?,
            count: self.count,
            next_page: self.next_page,
            previous_page: self.previous_page,
        })
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
            next_page: None,
            previous_page: None,
        }
    }
}

/// Parameters for paginating through large result sets.
///
/// Pages are 1-indexed: page 1 is the first page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PaginationParams {
    /// The page number (1-indexed).
    pub page: usize,
    /// Number of items per page.
    pub per_page: usize,
}

impl PaginationParams {
    /// Creates new pagination parameters.
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page: page.max(1),
            per_page,
        }
    }

    /// Number of items to skip to reach this page.
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.per_page
    }

    /// Slices an already-materialized result set into this page.
    ///
    /// A page past the end of `items` comes back empty but still reports the
    /// total count and the previous page, so callers can navigate back.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let count = items.len();
        if self.offset() >= count {
            return Page {
                items: Vec::new(),
                count,
                next_page: None,
                previous_page: (self.page > 1).then(|| self.page - 1),
            };
        }

        let end = min(self.offset() + self.per_page, count);
        Page {
            items: items
                .into_iter()
                .skip(self.offset())
                .take(end - self.offset())
                .collect(),
            count,
            next_page: (end < count).then(|| self.page + 1),
            previous_page: (self.page > 1).then(|| self.page - 1),
        }
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, per_page: 10 }
    }
}
