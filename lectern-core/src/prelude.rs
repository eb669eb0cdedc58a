//! Common imports for catalog consumers.

pub use crate::access::{
    AccessDecision, CategoryIndex, can_download, can_view, can_view_document,
    explain, resolve_visible, visible_categories,
};
pub use crate::config::{CatalogConfig, ConfigLoader};
pub use crate::controller::{CatalogController, CatalogEvent, CatalogView};
pub use crate::error::{CatalogError, StoreError};
pub use crate::live::{CollectionKind, LiveCollection, Subscription};
pub use crate::localize::{Localizer, NoTranslations, StaticTranslations};
pub use crate::params::CatalogParams;
pub use crate::query::{CategoryScope, DocumentQuery, Generation};
pub use crate::store::{CatalogSource, CatalogWriter, InMemoryStore};

pub use lectern_model::prelude::*;
