//! Ports onto the persistence collaborator.
//!
//! [`CatalogSource`] is the read side the catalog consumes: three push
//! streams, each returning an owned [`Subscription`]. [`CatalogWriter`] is
//! the write side exposed to administrative callers; the catalog itself
//! never writes. Failures of either side are reported, never retried.

pub mod decode;
pub mod memory;

use async_trait::async_trait;
use lectern_model::{
    Category, CategoryDraft, CategoryId, Document, DocumentDraft, DocumentId,
    Tag, TagDraft, TagId,
};

use crate::error::StoreError;
use crate::live::{ErrorFn, SnapshotFn, Subscription};
use crate::query::DocumentQuery;

pub use memory::InMemoryStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Push-based read access to the backing store.
///
/// Every implementation must deliver one snapshot promptly after a
/// subscription opens (even an empty one), deliver full arrays rather than
/// deltas, call `on_error` at most once, and never call either callback
/// after the returned subscription has been disposed.
pub trait CatalogSource: Send + Sync {
    fn subscribe_categories(
        &self,
        on_data: SnapshotFn<Category>,
        on_error: ErrorFn,
    ) -> Subscription;

    fn subscribe_tags(
        &self,
        on_data: SnapshotFn<Tag>,
        on_error: ErrorFn,
    ) -> Subscription;

    /// Server-filtered window: restricted by `query.scope`, ordered by
    /// `query.sort_by` at the source, truncated to `query.limit`.
    fn subscribe_filtered_documents(
        &self,
        query: &DocumentQuery,
        on_data: SnapshotFn<Document>,
        on_error: ErrorFn,
    ) -> Subscription;
}

/// Create/update/delete calls, fire-and-forget from the catalog's side.
#[async_trait]
pub trait CatalogWriter: Send + Sync {
    async fn create_category(
        &self,
        draft: CategoryDraft,
    ) -> StoreResult<CategoryId>;
    async fn update_category(&self, category: Category) -> StoreResult<()>;
    async fn delete_category(&self, id: &CategoryId) -> StoreResult<()>;

    async fn create_document(
        &self,
        draft: DocumentDraft,
    ) -> StoreResult<DocumentId>;
    async fn update_document(&self, document: Document) -> StoreResult<()>;
    async fn delete_document(&self, id: &DocumentId) -> StoreResult<()>;

    async fn create_tag(&self, draft: TagDraft) -> StoreResult<TagId>;
    async fn update_tag(&self, tag: Tag) -> StoreResult<()>;
    async fn delete_tag(&self, id: &TagId) -> StoreResult<()>;
}
