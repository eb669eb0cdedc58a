//! Push-based mirrors of remote collections.
//!
//! The store hands every subscriber the complete current array on each
//! change. [`SnapshotSink`] is the gate the store delivers through: it keeps
//! the callback pair, fires the error callback at most once, and refuses any
//! delivery after it has been closed. [`Subscription`] is the owned release
//! handle returned to the caller. [`LiveCollection`] is the consumer-side
//! mirror holding the latest snapshot and its version.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use tracing::{debug, warn};

use crate::error::StoreError;

/// Stream slots the catalog keeps open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Categories,
    Tags,
    Documents,
}

impl CollectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKind::Categories => "categories",
            CollectionKind::Tags => "tags",
            CollectionKind::Documents => "documents",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type SnapshotFn<T> = Box<dyn FnMut(Vec<T>) + Send>;
pub type ErrorFn = Box<dyn FnOnce(StoreError) + Send>;

struct SinkState<T> {
    on_snapshot: Option<SnapshotFn<T>>,
    on_error: Option<ErrorFn>,
    closed: bool,
}

/// Delivery gate shared between a store-side listener and its
/// [`Subscription`].
///
/// Deliveries and closing serialize on a re-entrant lock, so once
/// [`close`](Self::close) returns no callback is running on another thread
/// and none will start. A callback may close its own sink.
pub struct SnapshotSink<T> {
    kind: CollectionKind,
    state: Arc<ReentrantMutex<RefCell<SinkState<T>>>>,
}

impl<T> Clone for SnapshotSink<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Send + 'static> fmt::Debug for SnapshotSink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotSink")
            .field("kind", &self.kind)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<T: Send + 'static> SnapshotSink<T> {
    pub fn new(
        kind: CollectionKind,
        on_snapshot: SnapshotFn<T>,
        on_error: ErrorFn,
    ) -> Self {
        Self {
            kind,
            state: Arc::new(ReentrantMutex::new(RefCell::new(SinkState {
                on_snapshot: Some(on_snapshot),
                on_error: Some(on_error),
                closed: false,
            }))),
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Hands a full snapshot to the subscriber. Returns `false` once closed.
    pub fn deliver(&self, snapshot: Vec<T>) -> bool {
        let guard = self.state.lock();
        let mut callback = {
            let mut state = guard.borrow_mut();
            if state.closed {
                return false;
            }
            match state.on_snapshot.take() {
                Some(callback) => callback,
                // Already inside this sink's own callback.
                None => return false,
            }
        };

        callback(snapshot);

        let mut state = guard.borrow_mut();
        if !state.closed {
            state.on_snapshot = Some(callback);
        }
        true
    }

    /// Fires the error callback once and stops all further deliveries.
    pub fn fail(&self, error: StoreError) {
        let guard = self.state.lock();
        let on_error = {
            let mut state = guard.borrow_mut();
            if state.closed {
                return;
            }
            state.closed = true;
            state.on_snapshot = None;
            state.on_error.take()
        };
        warn!(stream = %self.kind, %error, "live collection stream failed");
        if let Some(on_error) = on_error {
            on_error(error);
        }
    }

    pub fn close(&self) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        state.closed = true;
        state.on_snapshot = None;
        state.on_error = None;
    }

    pub fn is_closed(&self) -> bool {
        let guard = self.state.lock();
        let closed = guard.borrow().closed;
        closed
    }
}

/// Owned handle to an open stream; releasing it is idempotent.
///
/// Dropping the handle releases it too, so a subscription can never
/// outlive its owner.
pub struct Subscription {
    kind: CollectionKind,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(
        kind: CollectionKind,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            kind,
            release: Some(Box::new(release)),
        }
    }

    /// A handle for a stream that never opened.
    pub fn closed(kind: CollectionKind) -> Self {
        Self {
            kind,
            release: None,
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Runs the release hook on the first call; later calls do nothing.
    pub fn dispose(&mut self) {
        if let Some(release) = self.release.take() {
            debug!(stream = %self.kind, "disposing subscription");
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Consumer-side mirror of one remote collection.
///
/// Holds the latest full snapshot behind an `Arc` so derived views can be
/// memoized by `version`, which increases on every replacement, including
/// the reset to empty on failure.
#[derive(Debug)]
pub struct LiveCollection<T> {
    kind: CollectionKind,
    items: Arc<Vec<T>>,
    version: u64,
    loaded: bool,
    error: Option<StoreError>,
    subscription: Option<Subscription>,
}

impl<T> LiveCollection<T> {
    pub fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            items: Arc::new(Vec::new()),
            version: 0,
            loaded: false,
            error: None,
            subscription: None,
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Installs a new subscription, disposing the previous one first, and
    /// marks the mirror as waiting for its first snapshot.
    pub fn attach(&mut self, subscription: Subscription) {
        self.detach();
        self.loaded = false;
        self.error = None;
        self.subscription = Some(subscription);
    }

    /// Disposes the current subscription, if any. Idempotent.
    pub fn detach(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.dispose();
        }
    }

    pub fn replace(&mut self, items: Vec<T>) {
        self.items = Arc::new(items);
        self.version += 1;
        self.loaded = true;
        self.error = None;
    }

    /// Drops the current contents ahead of a snapshot from a different
    /// stream, so nothing from the old stream stays visible meanwhile.
    pub fn restart(&mut self) {
        self.items = Arc::new(Vec::new());
        self.version += 1;
        self.loaded = false;
        self.error = None;
    }

    /// Empties the mirror and records the failure; it stays failed until
    /// the next [`attach`](Self::attach).
    pub fn fail(&mut self, error: StoreError) {
        self.items = Arc::new(Vec::new());
        self.version += 1;
        self.loaded = true;
        self.error = Some(error);
        self.detach();
    }

    pub fn items(&self) -> &Arc<Vec<T>> {
        &self.items
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.as_ref().is_some_and(Subscription::is_active)
    }

    pub fn error(&self) -> Option<&StoreError> {
        self.error.as_ref()
    }
}
