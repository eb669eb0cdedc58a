//! Owns the single filtered-document stream slot.
//!
//! Switching `(scope, sort)` bumps the generation first, then disposes the
//! old subscription, then opens the new one tagged with the new generation.
//! A callback from the old stream that is already running when the switch
//! starts sees a stale generation and drops its payload; one that is merely
//! queued downstream carries the stale generation and is dropped there.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lectern_model::{Document, SortBy};
use tracing::{debug, info};

use super::types::{CategoryScope, DocumentQuery, Generation};
use crate::error::StoreError;
use crate::live::{ErrorFn, SnapshotFn, Subscription};
use crate::store::CatalogSource;

/// Payloads forwarded from the active document stream.
#[derive(Debug, Clone)]
pub enum WindowEvent {
    Data {
        generation: Generation,
        documents: Vec<Document>,
    },
    Failed {
        generation: Generation,
        error: StoreError,
    },
}

impl WindowEvent {
    pub fn generation(&self) -> Generation {
        match self {
            WindowEvent::Data { generation, .. }
            | WindowEvent::Failed { generation, .. } => *generation,
        }
    }
}

pub type WindowSink = Arc<dyn Fn(WindowEvent) + Send + Sync>;

struct ActiveStream {
    query: DocumentQuery,
    generation: Generation,
    subscription: Subscription,
}

pub struct QueryCoordinator {
    source: Arc<dyn CatalogSource>,
    limit: usize,
    generation: Arc<AtomicU64>,
    active: Option<ActiveStream>,
}

impl fmt::Debug for QueryCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCoordinator")
            .field("limit", &self.limit)
            .field("generation", &self.current_generation())
            .field("query", &self.active_query())
            .finish()
    }
}

impl QueryCoordinator {
    pub fn new(source: Arc<dyn CatalogSource>, limit: usize) -> Self {
        Self {
            source,
            limit: limit.max(1),
            generation: Arc::new(AtomicU64::new(0)),
            active: None,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn current_generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::SeqCst))
    }

    /// True only for the generation of the stream currently installed.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.generation == generation)
            && self.current_generation() == generation
    }

    pub fn active_query(&self) -> Option<&DocumentQuery> {
        self.active.as_ref().map(|active| &active.query)
    }

    /// Points the slot at `(scope, sort_by)`.
    ///
    /// Returns the new generation when a subscription was (re)opened, or
    /// `None` when the active stream already serves these parameters. A
    /// stream that failed is not reopened for unchanged parameters.
    pub fn ensure(
        &mut self,
        scope: CategoryScope,
        sort_by: SortBy,
        sink: WindowSink,
    ) -> Option<Generation> {
        let query = DocumentQuery::new(scope, sort_by, self.limit);
        if let Some(active) = &self.active
            && active.query.same_stream(&query)
        {
            return None;
        }
        Some(self.replace(query, sink))
    }

    /// Unconditionally tears down the slot and opens `query`.
    pub fn replace(
        &mut self,
        query: DocumentQuery,
        sink: WindowSink,
    ) -> Generation {
        let generation =
            Generation(self.generation.fetch_add(1, Ordering::SeqCst) + 1);

        if let Some(mut previous) = self.active.take() {
            debug!(
                from = %previous.generation,
                to = %generation,
                scope = %previous.query.scope,
                "retiring document stream"
            );
            previous.subscription.dispose();
        }

        info!(
            %generation,
            scope = %query.scope,
            sort = %query.sort_by,
            limit = query.limit,
            "opening document stream"
        );

        let on_data: SnapshotFn<Document> = {
            let current = Arc::clone(&self.generation);
            let sink = Arc::clone(&sink);
            Box::new(move |documents| {
                if current.load(Ordering::SeqCst) != generation.0 {
                    debug!(%generation, "dropping snapshot from retired stream");
                    return;
                }
                sink(WindowEvent::Data {
                    generation,
                    documents,
                });
            })
        };
        let on_error: ErrorFn = {
            let current = Arc::clone(&self.generation);
            Box::new(move |error| {
                if current.load(Ordering::SeqCst) != generation.0 {
                    debug!(%generation, "dropping error from retired stream");
                    return;
                }
                sink(WindowEvent::Failed { generation, error });
            })
        };

        let subscription = self.subscribe_filtered(&query, on_data, on_error);
        self.active = Some(ActiveStream {
            query,
            generation,
            subscription,
        });
        generation
    }

    /// Raw pass-through to the source for callers managing their own slot.
    pub fn subscribe_filtered(
        &self,
        query: &DocumentQuery,
        on_data: SnapshotFn<Document>,
        on_error: ErrorFn,
    ) -> Subscription {
        self.source
            .subscribe_filtered_documents(query, on_data, on_error)
    }

    /// Retires the slot; any payload still in flight becomes stale.
    pub fn dispose(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(mut active) = self.active.take() {
            debug!(generation = %active.generation, "closing document stream");
            active.subscription.dispose();
        }
    }
}

impl Drop for QueryCoordinator {
    fn drop(&mut self) {
        self.dispose();
    }
}
