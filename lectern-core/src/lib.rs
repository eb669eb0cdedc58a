//! # Lectern Core
//!
//! Role-gated live access to a document catalog: the store pushes full
//! snapshots of categories, tags and a server-filtered document window, and
//! this crate turns them into the filtered, searched, sorted and paginated
//! view a given role is allowed to see.
//!
//! ## Overview
//!
//! - **Access**: pure visibility rules combining category and per-document
//!   grants, fail-closed for orphans
//! - **Live collections**: push-based mirrors with idempotent, drop-safe
//!   subscription handles
//! - **Query coordination**: one generation-tagged document stream per
//!   `(category, sort)` pair, so stale payloads never land
//! - **Refinement**: access, facet, search, tag, target-role and sort stages,
//!   memoized on input versions
//! - **Shareable state**: typed parameters with a query-string round trip
//! - **Controller**: ties it together and exposes a [`CatalogView`]
//!
//! ## Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use lectern_core::prelude::*;
//!
//! let store = InMemoryStore::from_json(r#"{
//!     "categories": [{
//!         "id": "c1",
//!         "nameKey": "categories.armoplit",
//!         "viewPermissions": ["foreman"]
//!     }],
//!     "documents": [
//!         { "id": "d1", "categoryKey": "categories.armoplit", "title": "Mixing guide" },
//!         { "id": "d2", "categoryKey": "categories.fixit", "title": "Orphan" }
//!     ]
//! }"#).unwrap();
//!
//! let mut catalog = CatalogController::new(
//!     Arc::new(store),
//!     CatalogConfig::default(),
//!     Role::Foreman,
//! );
//! catalog.pump();
//!
//! let view = catalog.view();
//! assert_eq!(view.visible_count, 1);
//! assert_eq!(view.documents[0].id.as_str(), "d1");
//! ```

#![allow(missing_docs)]

/// Role-based visibility rules
pub mod access;

/// Catalog configuration loading
pub mod config;

/// State controller producing the paginated view
pub mod controller;

/// Error types
pub mod error;

/// Push-based collection mirrors and subscription handles
pub mod live;

/// Localization port
pub mod localize;

/// Shareable URL parameters
pub mod params;

/// Filtered document stream coordination
pub mod query;

/// Client-side refinement pipeline
pub mod refine;

/// Persistence ports, boundary decoding and the in-memory store
pub mod store;

pub mod prelude;

pub use controller::{CatalogController, CatalogEvent, CatalogView};
pub use error::{CatalogError, Result, StoreError};
