//! In-process store implementing both ports.
//!
//! Mirrors the contract of the remote store closely enough to drive the
//! catalog end to end: every subscription gets a prompt initial snapshot,
//! every write re-pushes the full affected collection, the document stream
//! is filtered, source-ordered and truncated the way the remote query is,
//! and failures can be injected per stream.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use lectern_model::{
    Category, CategoryDraft, CategoryId, Document, DocumentDraft, DocumentId,
    SortBy, Tag, TagDraft, TagId,
};
use parking_lot::{Mutex, ReentrantMutex};
use tracing::{debug, info};

use super::decode::{DecodedCatalog, RawCatalog};
use super::{CatalogSource, CatalogWriter, StoreResult};
use crate::error::{CatalogError, StoreError};
use crate::live::{CollectionKind, ErrorFn, SnapshotFn, SnapshotSink, Subscription};
use crate::query::DocumentQuery;

struct Listener<T> {
    id: u64,
    sink: SnapshotSink<T>,
}

struct DocumentListener {
    id: u64,
    query: DocumentQuery,
    sink: SnapshotSink<Document>,
}

#[derive(Default)]
struct StoreState {
    categories: Vec<Category>,
    tags: Vec<Tag>,
    documents: Vec<Document>,
    category_listeners: Vec<Listener<Category>>,
    tag_listeners: Vec<Listener<Tag>>,
    document_listeners: Vec<DocumentListener>,
    next_listener: u64,
    offline: HashSet<CollectionKind>,
    write_rejection: Option<String>,
}

impl StoreState {
    fn next_id(&mut self) -> u64 {
        self.next_listener += 1;
        self.next_listener
    }

    fn remove_listener(&mut self, kind: CollectionKind, id: u64) {
        match kind {
            CollectionKind::Categories => {
                self.category_listeners.retain(|l| l.id != id)
            }
            CollectionKind::Tags => self.tag_listeners.retain(|l| l.id != id),
            CollectionKind::Documents => {
                self.document_listeners.retain(|l| l.id != id)
            }
        }
    }

    fn check_writable(&self) -> StoreResult<()> {
        match &self.write_rejection {
            Some(reason) => Err(StoreError::Write(reason.clone())),
            None => Ok(()),
        }
    }
}

/// Pending pushes collected under the state lock, delivered after it is
/// released so callbacks may call back into the store.
#[derive(Default)]
struct Outbox {
    categories: Vec<(SnapshotSink<Category>, Vec<Category>)>,
    tags: Vec<(SnapshotSink<Tag>, Vec<Tag>)>,
    documents: Vec<(SnapshotSink<Document>, Vec<Document>)>,
}

impl Outbox {
    fn flush(self) {
        for (sink, snapshot) in self.categories {
            sink.deliver(snapshot);
        }
        for (sink, snapshot) in self.tags {
            sink.deliver(snapshot);
        }
        for (sink, snapshot) in self.documents {
            sink.deliver(snapshot);
        }
    }
}

/// Shared, cloneable in-memory backing store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
    // Keeps pushes from concurrent writers in commit order.
    delivery: Arc<ReentrantMutex<()>>,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("InMemoryStore")
            .field("categories", &state.categories.len())
            .field("tags", &state.tags.len())
            .field("documents", &state.documents.len())
            .field("listeners", &(state.category_listeners.len()
                + state.tag_listeners.len()
                + state.document_listeners.len()))
            .finish()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: DecodedCatalog) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock();
            state.categories = catalog.categories;
            state.tags = catalog.tags;
            state.documents = catalog.documents;
        }
        store
    }

    /// Seeds from a raw JSON export, decoding records at the boundary.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        let catalog = raw.decode();
        info!(
            categories = catalog.categories.len(),
            tags = catalog.tags.len(),
            documents = catalog.documents.len(),
            "seeded in-memory store"
        );
        Ok(Self::with_catalog(catalog))
    }

    /// Number of open listeners on a stream slot.
    pub fn subscriber_count(&self, kind: CollectionKind) -> usize {
        let state = self.state.lock();
        match kind {
            CollectionKind::Categories => state.category_listeners.len(),
            CollectionKind::Tags => state.tag_listeners.len(),
            CollectionKind::Documents => state.document_listeners.len(),
        }
    }

    /// Breaks every open stream of `kind`; each subscriber sees one error.
    pub fn fail_stream(&self, kind: CollectionKind, reason: &str) {
        let error = StoreError::Subscription {
            stream: kind.to_string(),
            reason: reason.to_string(),
        };
        let _delivery = self.delivery.lock();
        let failed: Vec<Box<dyn FnOnce() + Send>> = {
            let mut state = self.state.lock();
            match kind {
                CollectionKind::Categories => state
                    .category_listeners
                    .drain(..)
                    .map(|l| fail_later(l.sink, error.clone()))
                    .collect(),
                CollectionKind::Tags => state
                    .tag_listeners
                    .drain(..)
                    .map(|l| fail_later(l.sink, error.clone()))
                    .collect(),
                CollectionKind::Documents => state
                    .document_listeners
                    .drain(..)
                    .map(|l| fail_later(l.sink, error.clone()))
                    .collect(),
            }
        };
        for fail in failed {
            fail();
        }
    }

    /// While offline, new subscriptions of `kind` fail on open.
    pub fn set_offline(&self, kind: CollectionKind, offline: bool) {
        let mut state = self.state.lock();
        if offline {
            state.offline.insert(kind);
        } else {
            state.offline.remove(&kind);
        }
    }

    /// Makes every write fail with `reason` until cleared with `None`.
    pub fn reject_writes(&self, reason: Option<&str>) {
        self.state.lock().write_rejection = reason.map(str::to_string);
    }

    pub fn documents(&self) -> Vec<Document> {
        self.state.lock().documents.clone()
    }

    fn open<T: Send + 'static>(
        &self,
        kind: CollectionKind,
        sink: SnapshotSink<T>,
        register: impl FnOnce(&mut StoreState, u64, SnapshotSink<T>) -> Vec<T>,
    ) -> Subscription {
        let _delivery = self.delivery.lock();
        let (id, initial) = {
            let mut state = self.state.lock();
            if state.offline.contains(&kind) {
                drop(state);
                sink.fail(StoreError::Subscription {
                    stream: kind.to_string(),
                    reason: "store unavailable".to_string(),
                });
                return Subscription::closed(kind);
            }
            let id = state.next_id();
            let initial = register(&mut state, id, sink.clone());
            (id, initial)
        };
        debug!(stream = %kind, listener = id, "subscription opened");
        sink.deliver(initial);

        let state = Arc::clone(&self.state);
        Subscription::new(kind, move || {
            sink.close();
            state.lock().remove_listener(kind, id);
        })
    }

    fn commit(
        &self,
        mutate: impl FnOnce(&mut StoreState) -> StoreResult<CollectionKind>,
    ) -> StoreResult<()> {
        let _delivery = self.delivery.lock();
        let outbox = {
            let mut state = self.state.lock();
            state.check_writable()?;
            let kind = mutate(&mut state)?;
            collect_pushes(&state, kind)
        };
        outbox.flush();
        Ok(())
    }
}

fn fail_later<T: Send + 'static>(
    sink: SnapshotSink<T>,
    error: StoreError,
) -> Box<dyn FnOnce() + Send> {
    Box::new(move || sink.fail(error))
}

fn collect_pushes(state: &StoreState, kind: CollectionKind) -> Outbox {
    let mut outbox = Outbox::default();
    match kind {
        CollectionKind::Categories => {
            outbox.categories = state
                .category_listeners
                .iter()
                .map(|l| (l.sink.clone(), state.categories.clone()))
                .collect();
        }
        CollectionKind::Tags => {
            outbox.tags = state
                .tag_listeners
                .iter()
                .map(|l| (l.sink.clone(), state.tags.clone()))
                .collect();
        }
        CollectionKind::Documents => {
            outbox.documents = state
                .document_listeners
                .iter()
                .map(|l| (l.sink.clone(), window(&state.documents, &l.query)))
                .collect();
        }
    }
    outbox
}

/// What the remote query returns: scope filter, source order, limit.
///
/// `Alpha` uses a plain byte-wise title order here, mirroring a store that
/// cannot collate; the refinement pipeline re-sorts it.
pub fn window(documents: &[Document], query: &DocumentQuery) -> Vec<Document> {
    let mut matching: Vec<Document> = documents
        .iter()
        .filter(|d| query.scope.matches(&d.category_key))
        .cloned()
        .collect();
    match query.sort_by {
        SortBy::Recent => {
            matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at))
        }
        SortBy::Alpha => matching.sort_by(|a, b| {
            let a = a.title.as_deref().unwrap_or_default();
            let b = b.title.as_deref().unwrap_or_default();
            a.cmp(b)
        }),
    }
    matching.truncate(query.limit);
    matching
}

impl CatalogSource for InMemoryStore {
    fn subscribe_categories(
        &self,
        on_data: SnapshotFn<Category>,
        on_error: ErrorFn,
    ) -> Subscription {
        let kind = CollectionKind::Categories;
        let sink = SnapshotSink::new(kind, on_data, on_error);
        self.open(kind, sink, |state, id, sink| {
            state.category_listeners.push(Listener { id, sink });
            state.categories.clone()
        })
    }

    fn subscribe_tags(
        &self,
        on_data: SnapshotFn<Tag>,
        on_error: ErrorFn,
    ) -> Subscription {
        let kind = CollectionKind::Tags;
        let sink = SnapshotSink::new(kind, on_data, on_error);
        self.open(kind, sink, |state, id, sink| {
            state.tag_listeners.push(Listener { id, sink });
            state.tags.clone()
        })
    }

    fn subscribe_filtered_documents(
        &self,
        query: &DocumentQuery,
        on_data: SnapshotFn<Document>,
        on_error: ErrorFn,
    ) -> Subscription {
        let kind = CollectionKind::Documents;
        let sink = SnapshotSink::new(kind, on_data, on_error);
        let query = query.clone();
        self.open(kind, sink, move |state, id, sink| {
            let initial = window(&state.documents, &query);
            state.document_listeners.push(DocumentListener { id, query, sink });
            initial
        })
    }
}

#[async_trait]
impl CatalogWriter for InMemoryStore {
    async fn create_category(
        &self,
        draft: CategoryDraft,
    ) -> StoreResult<CategoryId> {
        let id = CategoryId::generate();
        let category = draft.into_category(id.clone());
        self.commit(|state| {
            if state.categories.iter().any(|c| c.name_key == category.name_key) {
                return Err(StoreError::Write(format!(
                    "category key {} already exists",
                    category.name_key
                )));
            }
            state.categories.push(category);
            Ok(CollectionKind::Categories)
        })?;
        Ok(id)
    }

    async fn update_category(&self, category: Category) -> StoreResult<()> {
        self.commit(|state| {
            let slot = state
                .categories
                .iter_mut()
                .find(|c| c.id == category.id)
                .ok_or_else(|| not_found("category", category.id.as_str()))?;
            *slot = category;
            Ok(CollectionKind::Categories)
        })
    }

    async fn delete_category(&self, id: &CategoryId) -> StoreResult<()> {
        self.commit(|state| {
            let before = state.categories.len();
            state.categories.retain(|c| &c.id != id);
            if state.categories.len() == before {
                return Err(not_found("category", id.as_str()));
            }
            Ok(CollectionKind::Categories)
        })
    }

    async fn create_document(
        &self,
        draft: DocumentDraft,
    ) -> StoreResult<DocumentId> {
        let id = DocumentId::generate();
        let document = draft.into_document(id.clone(), Utc::now());
        self.commit(|state| {
            state.documents.push(document);
            Ok(CollectionKind::Documents)
        })?;
        Ok(id)
    }

    async fn update_document(&self, mut document: Document) -> StoreResult<()> {
        document.updated_at = Some(Utc::now());
        self.commit(|state| {
            let slot = state
                .documents
                .iter_mut()
                .find(|d| d.id == document.id)
                .ok_or_else(|| not_found("document", document.id.as_str()))?;
            *slot = document;
            Ok(CollectionKind::Documents)
        })
    }

    async fn delete_document(&self, id: &DocumentId) -> StoreResult<()> {
        self.commit(|state| {
            let before = state.documents.len();
            state.documents.retain(|d| &d.id != id);
            if state.documents.len() == before {
                return Err(not_found("document", id.as_str()));
            }
            Ok(CollectionKind::Documents)
        })
    }

    async fn create_tag(&self, draft: TagDraft) -> StoreResult<TagId> {
        let id = TagId::generate();
        let tag = draft.into_tag(id.clone());
        self.commit(|state| {
            state.tags.push(tag);
            Ok(CollectionKind::Tags)
        })?;
        Ok(id)
    }

    async fn update_tag(&self, tag: Tag) -> StoreResult<()> {
        self.commit(|state| {
            let slot = state
                .tags
                .iter_mut()
                .find(|t| t.id == tag.id)
                .ok_or_else(|| not_found("tag", tag.id.as_str()))?;
            *slot = tag;
            Ok(CollectionKind::Tags)
        })
    }

    async fn delete_tag(&self, id: &TagId) -> StoreResult<()> {
        self.commit(|state| {
            let before = state.tags.len();
            state.tags.retain(|t| &t.id != id);
            if state.tags.len() == before {
                return Err(not_found("tag", id.as_str()));
            }
            Ok(CollectionKind::Tags)
        })
    }
}

fn not_found(kind: &'static str, id: &str) -> StoreError {
    StoreError::NotFound {
        kind,
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::CategoryScope;
    use chrono::TimeZone;
    use std::sync::Mutex as StdMutex;

    fn doc(id: &str, key: &str, secs: Option<i64>, title: &str) -> Document {
        let mut d = Document::new(DocumentId::new(id).unwrap(), key).with_title(title);
        d.updated_at = secs.map(|s| Utc.timestamp_opt(s, 0).unwrap());
        d
    }

    fn recorder<T: Send + 'static>() -> (Arc<StdMutex<Vec<Vec<T>>>>, SnapshotFn<T>) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            Box::new(move |snapshot: Vec<T>| seen.lock().unwrap().push(snapshot))
                as SnapshotFn<T>
        };
        (seen, sink)
    }

    #[test]
    fn window_filters_orders_and_truncates() {
        let documents = vec![
            doc("a", "x", Some(5), "e"),
            doc("b", "x", Some(3), "d"),
            doc("c", "y", Some(9), "c"),
            doc("d", "x", None, "b"),
            doc("e", "x", Some(7), "a"),
        ];
        let query = DocumentQuery::new(
            CategoryScope::Only("x".into()),
            SortBy::Recent,
            3,
        );
        let ids: Vec<_> = window(&documents, &query)
            .into_iter()
            .map(|d| d.id.to_string())
            .collect();
        assert_eq!(ids, vec!["e", "a", "b"]);
    }

    #[test]
    fn alpha_window_truncates_after_bytewise_title_order() {
        let documents = vec![
            doc("1", "x", Some(1), "éclair"),
            doc("2", "x", Some(2), "fig"),
            doc("3", "x", Some(3), "Zebra"),
        ];
        let query = DocumentQuery::new(CategoryScope::All, SortBy::Alpha, 2);
        let ids: Vec<_> = window(&documents, &query)
            .into_iter()
            .map(|d| d.id.to_string())
            .collect();
        assert_eq!(ids, vec!["3", "2"]);
    }

    #[test]
    fn empty_collection_still_delivers_initial_snapshot() {
        let store = InMemoryStore::new();
        let (seen, on_data) = recorder::<Tag>();
        let _sub = store.subscribe_tags(on_data, Box::new(|_| {}));
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert!(seen.lock().unwrap()[0].is_empty());
    }

    #[tokio::test]
    async fn writes_push_full_snapshots_until_disposed() {
        let store = InMemoryStore::new();
        let (seen, on_data) = recorder::<Tag>();
        let mut sub = store.subscribe_tags(on_data, Box::new(|_| {}));

        store
            .create_tag(TagDraft { name: "Safety".into(), color: "#f00".into() })
            .await
            .unwrap();
        store
            .create_tag(TagDraft { name: "Rebar".into(), color: "#0f0".into() })
            .await
            .unwrap();
        sub.dispose();
        store
            .create_tag(TagDraft { name: "Late".into(), color: "#00f".into() })
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        let sizes: Vec<_> = seen.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![0, 1, 2]);
        assert_eq!(store.subscriber_count(CollectionKind::Tags), 0);
    }

    #[tokio::test]
    async fn rejected_writes_surface_to_the_caller() {
        let store = InMemoryStore::new();
        store.reject_writes(Some("read-only replica"));
        let err = store
            .create_category(CategoryDraft::default())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Write("read-only replica".into()));

        store.reject_writes(None);
        let missing = TagId::new("nope").unwrap();
        assert!(matches!(
            store.delete_tag(&missing).await,
            Err(StoreError::NotFound { kind: "tag", .. })
        ));
    }

    #[test]
    fn offline_stream_reports_error_on_open() {
        let store = InMemoryStore::new();
        store.set_offline(CollectionKind::Categories, true);
        let errors = Arc::new(StdMutex::new(0));
        let (seen, on_data) = recorder::<Category>();
        let sub = {
            let errors = errors.clone();
            store.subscribe_categories(
                on_data,
                Box::new(move |_| *errors.lock().unwrap() += 1),
            )
        };
        assert!(!sub.is_active());
        assert_eq!(*errors.lock().unwrap(), 1);
        assert!(seen.lock().unwrap().is_empty());
    }
}
