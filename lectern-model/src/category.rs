use std::collections::BTreeSet;

use crate::ids::CategoryId;
use crate::role::Role;

/// Grouping of documents that carries a role-level view permission set.
///
/// `name_key` is the stable, unique key documents point at through
/// [`Document::category_key`](crate::Document::category_key). It doubles as
/// the localization key for the category label.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Category {
    pub id: CategoryId,
    pub name_key: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub view_permissions: BTreeSet<Role>,
}

impl Category {
    pub fn new(
        id: CategoryId,
        name_key: impl Into<String>,
        view_permissions: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            id,
            name_key: name_key.into(),
            view_permissions: view_permissions.into_iter().collect(),
        }
    }

    pub fn grants(&self, role: Role) -> bool {
        self.view_permissions.contains(&role)
    }
}

/// Payload for creating a category; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CategoryDraft {
    pub name_key: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub view_permissions: BTreeSet<Role>,
}

impl CategoryDraft {
    pub fn into_category(self, id: CategoryId) -> Category {
        Category {
            id,
            name_key: self.name_key,
            view_permissions: self.view_permissions,
        }
    }
}
