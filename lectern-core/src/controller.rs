//! The catalog state controller.
//!
//! Owns the shareable parameters plus the ephemeral sort and view mode,
//! keeps the three store streams open, and turns their latest snapshots
//! into a paginated [`CatalogView`].
//!
//! Store callbacks never touch controller state directly. They enqueue a
//! [`CatalogEvent`] on an unbounded channel and the owner applies queued
//! events with [`CatalogController::pump`] or
//! [`CatalogController::next_event`], on whatever task owns the controller.
//! Document events carry the generation they were subscribed under and are
//! checked again when applied, so a payload queued before a parameter
//! switch is discarded.

use std::fmt;
use std::sync::Arc;

use lectern_model::{Category, Document, Role, SortBy, Tag, TagId, ViewMode};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::access::visible_categories;
use crate::config::CatalogConfig;
use crate::error::{Result, StoreError};
use crate::live::{CollectionKind, ErrorFn, LiveCollection, SnapshotFn};
use crate::localize::{Localizer, NoTranslations};
use crate::params::CatalogParams;
use crate::query::{
    ALL_CATEGORIES, CategoryScope, QueryCoordinator, WindowEvent, WindowSink,
};
use crate::refine::{RefineFilters, RefinePipeline};
use crate::store::CatalogSource;

/// Payloads forwarded from store callbacks to the owning task.
#[derive(Debug, Clone)]
pub enum CatalogEvent {
    Categories(Vec<Category>),
    CategoriesFailed(StoreError),
    Tags(Vec<Tag>),
    TagsFailed(StoreError),
    Window(WindowEvent),
}

/// Everything a front end needs to render one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    pub documents: Vec<Document>,
    pub visible_count: usize,
    pub page: u32,
    pub total_pages: u32,
    pub page_size: usize,
    pub loading: bool,
    /// Stream failure, if any of the three slots failed.
    pub error: Option<String>,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
    pub query: String,
    pub sort_by: SortBy,
    pub view_mode: ViewMode,
}

impl CatalogView {
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

pub struct CatalogController {
    source: Arc<dyn CatalogSource>,
    config: CatalogConfig,
    viewer: Role,
    localizer: Arc<dyn Localizer>,
    params: CatalogParams,
    sort_by: SortBy,
    view_mode: ViewMode,
    categories: LiveCollection<Category>,
    tags: LiveCollection<Tag>,
    documents: LiveCollection<Document>,
    coordinator: QueryCoordinator,
    pipeline: RefinePipeline,
    events_tx: mpsc::UnboundedSender<CatalogEvent>,
    events_rx: mpsc::UnboundedReceiver<CatalogEvent>,
    shut_down: bool,
}

impl fmt::Debug for CatalogController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogController")
            .field("viewer", &self.viewer)
            .field("params", &self.params)
            .field("sort_by", &self.sort_by)
            .field("coordinator", &self.coordinator)
            .field("shut_down", &self.shut_down)
            .finish()
    }
}

impl CatalogController {
    /// Opens the category, tag and document streams for `viewer`.
    ///
    /// Initial snapshots are queued, not applied; call [`pump`](Self::pump)
    /// before reading the first view.
    pub fn new(
        source: Arc<dyn CatalogSource>,
        config: CatalogConfig,
        viewer: Role,
    ) -> Self {
        Self::with_params(source, config, viewer, CatalogParams::default())
    }

    /// Like [`new`](Self::new) but starting from restored parameters, e.g.
    /// parsed from a shared link. The page survives until the window loads.
    pub fn with_params(
        source: Arc<dyn CatalogSource>,
        config: CatalogConfig,
        viewer: Role,
        params: CatalogParams,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let coordinator =
            QueryCoordinator::new(Arc::clone(&source), config.fetch_limit);
        let mut controller = Self {
            source,
            sort_by: config.default_sort,
            config,
            viewer,
            localizer: Arc::new(NoTranslations),
            params,
            view_mode: ViewMode::default(),
            categories: LiveCollection::new(CollectionKind::Categories),
            tags: LiveCollection::new(CollectionKind::Tags),
            documents: LiveCollection::new(CollectionKind::Documents),
            coordinator,
            pipeline: RefinePipeline::new(),
            events_tx,
            events_rx,
            shut_down: false,
        };
        info!(viewer = %viewer, "starting catalog");
        controller.open_reference_streams();
        controller.sync_document_stream();
        controller
    }

    pub fn with_localizer(mut self, localizer: Arc<dyn Localizer>) -> Self {
        self.set_localizer(localizer);
        self
    }

    /// Swaps the active translations; display titles and the alphabetic
    /// order are recomputed on the next read.
    pub fn set_localizer(&mut self, localizer: Arc<dyn Localizer>) {
        self.localizer = localizer;
        self.pipeline.invalidate();
    }

    fn open_reference_streams(&mut self) {
        let on_categories: SnapshotFn<Category> = {
            let tx = self.events_tx.clone();
            Box::new(move |items| {
                let _ = tx.send(CatalogEvent::Categories(items));
            })
        };
        let on_categories_error: ErrorFn = {
            let tx = self.events_tx.clone();
            Box::new(move |error| {
                let _ = tx.send(CatalogEvent::CategoriesFailed(error));
            })
        };
        let subscription = self
            .source
            .subscribe_categories(on_categories, on_categories_error);
        self.categories.attach(subscription);

        let on_tags: SnapshotFn<Tag> = {
            let tx = self.events_tx.clone();
            Box::new(move |items| {
                let _ = tx.send(CatalogEvent::Tags(items));
            })
        };
        let on_tags_error: ErrorFn = {
            let tx = self.events_tx.clone();
            Box::new(move |error| {
                let _ = tx.send(CatalogEvent::TagsFailed(error));
            })
        };
        let subscription = self.source.subscribe_tags(on_tags, on_tags_error);
        self.tags.attach(subscription);
    }

    fn window_sink(&self) -> WindowSink {
        let tx = self.events_tx.clone();
        Arc::new(move |event| {
            let _ = tx.send(CatalogEvent::Window(event));
        })
    }

    /// Server-side scope for the current selection: a single selected
    /// category is pushed to the source, anything else streams everything.
    fn scope(&self) -> CategoryScope {
        match self.params.categories() {
            [only] => CategoryScope::from_key(Some(only.as_str())),
            _ => CategoryScope::All,
        }
    }

    fn sync_document_stream(&mut self) {
        if self.shut_down {
            return;
        }
        let sink = self.window_sink();
        let scope = self.scope();
        if let Some(generation) =
            self.coordinator.ensure(scope, self.sort_by, sink)
        {
            debug!(%generation, "document window reset");
            self.documents.restart();
        }
    }

    /// Applies every queued event; returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if self.apply(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next event and applies it. Returns `false` once the
    /// controller has been shut down.
    pub async fn next_event(&mut self) -> bool {
        if self.shut_down {
            return false;
        }
        match self.events_rx.recv().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, event: CatalogEvent) -> bool {
        if self.shut_down {
            return false;
        }
        match event {
            CatalogEvent::Categories(items) => {
                debug!(count = items.len(), "categories snapshot");
                self.categories.replace(items);
            }
            CatalogEvent::CategoriesFailed(error) => {
                warn!(%error, "category stream failed");
                self.categories.fail(error);
            }
            CatalogEvent::Tags(items) => {
                debug!(count = items.len(), "tags snapshot");
                self.tags.replace(items);
            }
            CatalogEvent::TagsFailed(error) => {
                warn!(%error, "tag stream failed");
                self.tags.fail(error);
            }
            CatalogEvent::Window(event) => {
                let generation = event.generation();
                if !self.coordinator.is_current(generation) {
                    debug!(%generation, "discarding stale window event");
                    return false;
                }
                match event {
                    WindowEvent::Data { documents, .. } => {
                        debug!(
                            %generation,
                            count = documents.len(),
                            "document window"
                        );
                        self.documents.replace(documents);
                    }
                    WindowEvent::Failed { error, .. } => {
                        warn!(%generation, %error, "document stream failed");
                        self.documents.fail(error);
                    }
                }
            }
        }
        self.clamp_page();
        true
    }

    fn filters(&self) -> RefineFilters {
        RefineFilters {
            viewer: self.viewer,
            search: self.params.search().to_string(),
            categories: self
                .params
                .category_set()
                .into_iter()
                .filter(|key| key != ALL_CATEGORIES)
                .collect(),
            tags: self.params.tag_set(),
            roles: self.params.role_set(),
            sort_by: self.sort_by,
        }
    }

    fn refined(&mut self) -> Arc<Vec<Document>> {
        let filters = self.filters();
        self.pipeline.run(
            (self.documents.items().as_slice(), self.documents.version()),
            (self.categories.items().as_slice(), self.categories.version()),
            &filters,
            self.localizer.as_ref(),
        )
    }

    fn is_settled(&self) -> bool {
        self.documents.is_loaded() && self.categories.is_loaded()
    }

    /// Pulls the page back inside the available range. Skipped while data
    /// is still loading so a restored page is not lost to an empty window.
    fn clamp_page(&mut self) {
        if !self.is_settled() {
            return;
        }
        let last = self.total_pages().max(1);
        if self.params.page() > last {
            info!(from = self.params.page(), to = last, "clamping page");
            self.params.set_page(last);
        }
    }

    pub fn viewer(&self) -> Role {
        self.viewer
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn params(&self) -> &CatalogParams {
        &self.params
    }

    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn query_string(&self) -> String {
        self.params.to_query_string()
    }

    pub fn is_loading(&self) -> bool {
        !self.is_settled()
    }

    pub fn visible_count(&mut self) -> usize {
        self.refined().len()
    }

    /// `ceil(visible / page_size)`; zero when nothing is visible.
    pub fn total_pages(&mut self) -> u32 {
        let count = self.visible_count();
        let pages = count.div_ceil(self.config.page_size.max(1));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.params.set_search(search);
    }

    /// Toggles a category key; the document stream follows when the
    /// single-category scope changes.
    pub fn toggle_category(&mut self, key: impl Into<String>) -> bool {
        let selected = self.params.toggle_category(key);
        self.sync_document_stream();
        selected
    }

    pub fn toggle_role(&mut self, role: Role) -> bool {
        self.params.toggle_role(role)
    }

    pub fn toggle_tag(&mut self, tag: TagId) -> bool {
        self.params.toggle_tag(tag)
    }

    pub fn go_to_page(&mut self, page: u32) {
        self.params.set_page(page);
        self.clamp_page();
    }

    pub fn next_page(&mut self) {
        let page = self.params.page();
        if page < self.total_pages() {
            self.params.set_page(page + 1);
        }
    }

    pub fn prev_page(&mut self) {
        let page = self.params.page();
        if page > 1 {
            self.params.set_page(page - 1);
        }
    }

    /// Changes the order; re-subscribes because the source orders the
    /// window before truncating it.
    pub fn set_sort(&mut self, sort_by: SortBy) {
        if self.sort_by == sort_by {
            return;
        }
        self.sort_by = sort_by;
        self.sync_document_stream();
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        self.view_mode = view_mode;
    }

    /// Clears every shareable key; sort and view mode stay.
    pub fn reset_filters(&mut self) {
        self.params.reset();
        self.sync_document_stream();
    }

    /// Replaces the shareable state from a query string, leniently.
    pub fn apply_query_string(&mut self, query: &str) {
        self.params = CatalogParams::parse(query);
        self.sync_document_stream();
        self.clamp_page();
    }

    /// Strict variant: rejects the whole string on the first bad value and
    /// leaves the current state untouched.
    pub fn try_apply_query_string(&mut self, query: &str) -> Result<()> {
        self.params = CatalogParams::parse_strict(query)?;
        self.sync_document_stream();
        self.clamp_page();
        Ok(())
    }

    /// Current page of the refined window plus everything around it.
    pub fn view(&mut self) -> CatalogView {
        let refined = self.refined();
        let page_size = self.config.page_size.max(1);
        let total_pages = u32::try_from(refined.len().div_ceil(page_size))
            .unwrap_or(u32::MAX);
        let page = self.params.page();
        let start = (page as usize - 1).saturating_mul(page_size);
        let documents = refined
            .iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();

        let error = self
            .documents
            .error()
            .or(self.categories.error())
            .or(self.tags.error())
            .map(ToString::to_string);

        CatalogView {
            documents,
            visible_count: refined.len(),
            page,
            total_pages,
            page_size,
            loading: self.is_loading(),
            error,
            categories: visible_categories(
                self.viewer,
                self.categories.items(),
            )
            .into_iter()
            .cloned()
            .collect(),
            tags: self.tags.items().as_ref().clone(),
            query: self.query_string(),
            sort_by: self.sort_by,
            view_mode: self.view_mode,
        }
    }

    /// Disposes every open subscription exactly once and drops anything
    /// still queued. Later calls do nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.coordinator.dispose();
        self.categories.detach();
        self.tags.detach();
        let mut dropped = 0usize;
        while self.events_rx.try_recv().is_ok() {
            dropped += 1;
        }
        info!(dropped, "catalog shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl Drop for CatalogController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::store::decode::DecodedCatalog;
    use lectern_model::{CategoryId, DocumentId};

    fn store(documents: usize) -> InMemoryStore {
        let categories = vec![
            Category::new(CategoryId::new("c1").unwrap(), "a", [Role::Worker]),
            Category::new(CategoryId::new("c2").unwrap(), "b", [Role::Worker]),
        ];
        let documents = (0..documents)
            .map(|i| {
                let key = if i % 2 == 0 { "a" } else { "b" };
                Document::new(DocumentId::new(format!("d{i}")).unwrap(), key)
                    .with_title(format!("Doc {i}"))
            })
            .collect();
        InMemoryStore::with_catalog(DecodedCatalog {
            categories,
            tags: vec![Tag::new(TagId::new("t1").unwrap(), "Safety", "#f00")],
            documents,
        })
    }

    fn controller(store: &InMemoryStore) -> CatalogController {
        CatalogController::new(
            Arc::new(store.clone()),
            CatalogConfig::default(),
            Role::Worker,
        )
    }

    #[test]
    fn view_is_loading_until_first_snapshots_are_applied() {
        let store = store(3);
        let mut catalog = controller(&store);
        assert!(catalog.view().loading);

        assert_eq!(catalog.pump(), 3);
        let view = catalog.view();
        assert!(!view.loading);
        assert_eq!(view.visible_count, 3);
        assert_eq!(view.categories.len(), 2);
        assert_eq!(view.tags.len(), 1);
    }

    #[test]
    fn paginates_by_page_size() {
        let store = store(20);
        let mut catalog = controller(&store);
        catalog.pump();

        assert_eq!(catalog.total_pages(), 3);
        catalog.go_to_page(3);
        let view = catalog.view();
        assert_eq!(view.page, 3);
        assert_eq!(view.documents.len(), 2);

        catalog.next_page();
        assert_eq!(catalog.params().page(), 3);
        catalog.prev_page();
        assert_eq!(catalog.params().page(), 2);
    }

    #[test]
    fn filter_changes_reset_page_and_sort_is_not_shared() {
        let store = store(20);
        let mut catalog = controller(&store);
        catalog.pump();
        catalog.go_to_page(2);

        catalog.set_sort(SortBy::Alpha);
        catalog.set_view_mode(ViewMode::List);
        catalog.pump();
        assert_eq!(catalog.query_string(), "page=2");

        catalog.set_search("doc 1");
        assert_eq!(catalog.params().page(), 1);
        assert_eq!(catalog.query_string(), "q=doc+1");
    }

    #[test]
    fn reset_keeps_sort_and_view_mode() {
        let store = store(4);
        let mut catalog = controller(&store);
        catalog.pump();
        catalog.set_sort(SortBy::Alpha);
        catalog.set_view_mode(ViewMode::List);
        catalog.toggle_category("a");
        catalog.set_search("x");
        catalog.reset_filters();
        catalog.pump();

        assert!(catalog.params().has_no_filters());
        assert_eq!(catalog.sort_by(), SortBy::Alpha);
        assert_eq!(catalog.view_mode(), ViewMode::List);
        assert_eq!(catalog.view().visible_count, 4);
    }

    #[test]
    fn strict_query_string_failure_keeps_state() {
        let store = store(4);
        let mut catalog = controller(&store);
        catalog.pump();
        catalog.set_search("doc");

        assert!(catalog.try_apply_query_string("role=wizard").is_err());
        assert_eq!(catalog.params().search(), "doc");
    }
}
