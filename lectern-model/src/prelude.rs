//! Flat snapshot of the model surface for downstream crates.

pub use super::category::{Category, CategoryDraft};
pub use super::document::{Document, DocumentDraft};
pub use super::ids::{CategoryId, DocumentId, TagId};
pub use super::role::Role;
pub use super::sort::{SortBy, ViewMode};
pub use super::tag::{Tag, TagDraft};
