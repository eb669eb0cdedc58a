//! Core data model definitions shared across Lectern crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod category;
pub mod document;
pub mod error;
pub mod ids;
pub mod prelude;
pub mod role;
pub mod sort;
pub mod tag;

pub use category::{Category, CategoryDraft};
pub use document::{Document, DocumentDraft};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{CategoryId, DocumentId, TagId};
pub use role::Role;
pub use sort::{SortBy, ViewMode};
pub use tag::{Tag, TagDraft};
