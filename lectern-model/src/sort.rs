use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Ordering applied to the document list.
///
/// The store honours `Recent` at the source. `Alpha` is only advisory there:
/// the refinement pipeline always recomputes the alphabetic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SortBy {
    #[default]
    Recent,
    Alpha,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Recent => "recent",
            SortBy::Alpha => "alpha",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recent" => Ok(SortBy::Recent),
            "alpha" => Ok(SortBy::Alpha),
            _ => Err(ModelError::UnknownSort(s.to_string())),
        }
    }
}

/// Presentation hint kept next to the sort order; never shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl FromStr for ViewMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(ViewMode::Grid),
            "list" => Ok(ViewMode::List),
            _ => Err(ModelError::UnknownViewMode(s.to_string())),
        }
    }
}
