use std::fmt;

use lectern_model::SortBy;

/// Sentinel category key meaning "no server-side category restriction".
pub const ALL_CATEGORIES: &str = "all";

/// Server-side category restriction of the document stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CategoryScope {
    #[default]
    All,
    Only(String),
}

impl CategoryScope {
    /// Absent, blank, or `"all"` widen to [`CategoryScope::All`].
    pub fn from_key(key: Option<&str>) -> Self {
        match key.map(str::trim) {
            None | Some("") | Some(ALL_CATEGORIES) => CategoryScope::All,
            Some(key) => CategoryScope::Only(key.to_string()),
        }
    }

    pub fn matches(&self, category_key: &str) -> bool {
        match self {
            CategoryScope::All => true,
            CategoryScope::Only(key) => key == category_key,
        }
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            CategoryScope::All => None,
            CategoryScope::Only(key) => Some(key.as_str()),
        }
    }
}

impl fmt::Display for CategoryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key().unwrap_or(ALL_CATEGORIES))
    }
}

/// Parameters of one filtered document stream.
///
/// `limit` caps the fetched window: documents past it are invisible to every
/// later stage whatever their sort position or permissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentQuery {
    pub scope: CategoryScope,
    pub sort_by: SortBy,
    pub limit: usize,
}

impl DocumentQuery {
    pub fn new(scope: CategoryScope, sort_by: SortBy, limit: usize) -> Self {
        Self {
            scope,
            sort_by,
            limit,
        }
    }

    /// Streams are keyed by `(scope, sort_by)`; the limit is fixed per
    /// catalog and never triggers a resubscribe on its own.
    pub fn same_stream(&self, other: &DocumentQuery) -> bool {
        self.scope == other.scope && self.sort_by == other.sort_by
    }
}

/// Monotonic tag attached to each document subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}
