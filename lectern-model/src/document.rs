use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::ids::{DocumentId, TagId};
use crate::role::Role;

/// A catalog entry as last pushed by the store.
///
/// `view_permissions` only ever extends what the category grants; an empty
/// set means "inherit from the category". `category_key` references
/// [`Category::name_key`](crate::Category::name_key) and may dangle, in which
/// case the document is an orphan and only admins see it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Document {
    pub id: DocumentId,
    pub category_key: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tag_ids: BTreeSet<TagId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub view_permissions: BTreeSet<Role>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub download_permissions: BTreeSet<Role>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub updated_at: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: Option<String>,
    /// Localization key; wins over `title` when a translation exists.
    #[cfg_attr(feature = "serde", serde(default))]
    pub title_key: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
}

impl Document {
    pub fn new(id: DocumentId, category_key: impl Into<String>) -> Self {
        Self {
            id,
            category_key: category_key.into(),
            tag_ids: BTreeSet::new(),
            view_permissions: BTreeSet::new(),
            download_permissions: BTreeSet::new(),
            updated_at: None,
            title: None,
            title_key: None,
            description: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_title_key(mut self, key: impl Into<String>) -> Self {
        self.title_key = Some(key.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = TagId>) -> Self {
        self.tag_ids = tags.into_iter().collect();
        self
    }

    pub fn with_view_permissions(
        mut self,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        self.view_permissions = roles.into_iter().collect();
        self
    }

    pub fn with_download_permissions(
        mut self,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        self.download_permissions = roles.into_iter().collect();
        self
    }

    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub fn has_tag(&self, tag: &TagId) -> bool {
        self.tag_ids.contains(tag)
    }
}

/// Payload for creating a document; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DocumentDraft {
    pub category_key: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tag_ids: BTreeSet<TagId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub view_permissions: BTreeSet<Role>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub download_permissions: BTreeSet<Role>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title_key: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
}

impl DocumentDraft {
    pub fn into_document(
        self,
        id: DocumentId,
        updated_at: DateTime<Utc>,
    ) -> Document {
        Document {
            id,
            category_key: self.category_key,
            tag_ids: self.tag_ids,
            view_permissions: self.view_permissions,
            download_permissions: self.download_permissions,
            updated_at: Some(updated_at),
            title: self.title,
            title_key: self.title_key,
            description: self.description,
        }
    }
}
