use lectern_model::SortBy;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 9;
pub const DEFAULT_FETCH_LIMIT: usize = 200;

/// Resolved settings for one catalog instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Documents per page of the final view.
    pub page_size: usize,
    /// Hard cap on the server-side document window. Documents past it are
    /// invisible to every role.
    pub fetch_limit: usize,
    /// Sort order a fresh controller starts with.
    pub default_sort: SortBy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            default_sort: SortBy::Recent,
        }
    }
}

impl CatalogConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_fetch_limit(mut self, fetch_limit: usize) -> Self {
        self.fetch_limit = fetch_limit;
        self
    }

    pub fn with_default_sort(mut self, sort: SortBy) -> Self {
        self.default_sort = sort;
        self
    }
}
