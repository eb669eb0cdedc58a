//! Role-based visibility rules for the catalog.
//!
//! Visibility is OR-composed over three grants:
//!
//! - **Category**: the document's category is known and lists the role
//! - **Document**: the document's own `view_permissions` lists the role
//! - **Admin**: admins see everything
//!
//! Document permissions only ever extend access. A document whose
//! `category_key` matches no known category (an orphan) gets no category
//! grant, so unless it names the role itself it stays admin-only.
//!
//! Every function here is pure: the output depends only on the arguments,
//! which is what lets the refinement pipeline memoize on input versions.
//!
//! ## Example
//!
//! ```
//! use lectern_core::access::{CategoryIndex, can_view_document};
//! use lectern_model::{Category, CategoryId, Document, DocumentId, Role};
//!
//! let categories = vec![Category::new(
//!     CategoryId::new("c1").unwrap(),
//!     "categories.armoplit",
//!     [Role::Foreman],
//! )];
//! let index = CategoryIndex::new(&categories);
//! let doc = Document::new(DocumentId::new("d1").unwrap(), "categories.armoplit");
//! assert!(can_view_document(Role::Foreman, &doc, &index));
//! assert!(!can_view_document(Role::Guest, &doc, &index));
//! ```

use std::collections::HashMap;

use lectern_model::{Category, Document, Role};

/// Why a role was granted or refused a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Admin,
    Category,
    Document,
    /// Category exists but does not list the role.
    NotGranted,
    /// `category_key` matches no known category.
    Orphan,
}

impl AccessDecision {
    pub fn is_granted(self) -> bool {
        matches!(
            self,
            AccessDecision::Admin
                | AccessDecision::Category
                | AccessDecision::Document
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessDecision::Admin => "admin",
            AccessDecision::Category => "category",
            AccessDecision::Document => "document",
            AccessDecision::NotGranted => "not-granted",
            AccessDecision::Orphan => "orphan",
        }
    }
}

/// Lookup of categories by `name_key`, built once per evaluation pass.
///
/// When the store pushes two categories with the same key the first one
/// wins; keys are unique by contract so this only matters for bad data.
#[derive(Debug, Default)]
pub struct CategoryIndex<'a> {
    by_key: HashMap<&'a str, &'a Category>,
}

impl<'a> CategoryIndex<'a> {
    pub fn new(categories: &'a [Category]) -> Self {
        let mut by_key = HashMap::with_capacity(categories.len());
        for category in categories {
            by_key.entry(category.name_key.as_str()).or_insert(category);
        }
        Self { by_key }
    }

    pub fn get(&self, key: &str) -> Option<&'a Category> {
        self.by_key.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// True iff the category lists the role, or the role is admin.
pub fn can_view(role: Role, category: &Category) -> bool {
    role.is_admin() || category.grants(role)
}

/// Full decision for one document, including the reason.
pub fn explain(
    role: Role,
    document: &Document,
    categories: &CategoryIndex<'_>,
) -> AccessDecision {
    if role.is_admin() {
        return AccessDecision::Admin;
    }
    match categories.get(&document.category_key) {
        Some(category) if can_view(role, category) => AccessDecision::Category,
        _ if document.view_permissions.contains(&role) => {
            AccessDecision::Document
        }
        Some(_) => AccessDecision::NotGranted,
        None => AccessDecision::Orphan,
    }
}

pub fn can_view_document(
    role: Role,
    document: &Document,
    categories: &CategoryIndex<'_>,
) -> bool {
    explain(role, document, categories).is_granted()
}

/// Documents the role may see, in input order.
pub fn resolve_visible<'d>(
    role: Role,
    documents: &'d [Document],
    categories: &[Category],
) -> Vec<&'d Document> {
    let index = CategoryIndex::new(categories);
    documents
        .iter()
        .filter(|document| can_view_document(role, document, &index))
        .collect()
}

/// Categories the role may browse.
pub fn visible_categories(role: Role, categories: &[Category]) -> Vec<&Category> {
    categories
        .iter()
        .filter(|category| can_view(role, category))
        .collect()
}

/// Download is granted only by the document itself, or to admins.
pub fn can_download(role: Role, document: &Document) -> bool {
    role.is_admin() || document.download_permissions.contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_model::{CategoryId, DocumentId};

    fn category(key: &str, roles: &[Role]) -> Category {
        Category::new(
            CategoryId::new(format!("id-{key}")).unwrap(),
            key,
            roles.iter().copied(),
        )
    }

    fn doc(id: &str, key: &str) -> Document {
        Document::new(DocumentId::new(id).unwrap(), key)
    }

    fn ids(docs: &[&Document]) -> Vec<String> {
        docs.iter().map(|d| d.id.to_string()).collect()
    }

    #[test]
    fn orphan_documents_are_admin_only() {
        let categories =
            vec![category("categories.armoplit", &[Role::Foreman])];
        let documents = vec![
            doc("d1", "categories.armoplit"),
            doc("d2", "categories.fixit"),
        ];

        let foreman = resolve_visible(Role::Foreman, &documents, &categories);
        assert_eq!(ids(&foreman), vec!["d1"]);

        let admin = resolve_visible(Role::Admin, &documents, &categories);
        assert_eq!(ids(&admin), vec!["d1", "d2"]);
    }

    #[test]
    fn document_permissions_extend_category_access() {
        let categories = vec![category("categories.hr", &[Role::Hr])];
        let documents = vec![
            doc("d1", "categories.hr").with_view_permissions([Role::Worker]),
            doc("d2", "categories.hr"),
            doc("d3", "categories.unknown")
                .with_view_permissions([Role::Worker]),
        ];

        let worker = resolve_visible(Role::Worker, &documents, &categories);
        assert_eq!(ids(&worker), vec!["d1", "d3"]);

        // The override never takes the category grant away.
        let hr = resolve_visible(Role::Hr, &documents, &categories);
        assert_eq!(ids(&hr), vec!["d1", "d2"]);
    }

    #[test]
    fn admin_sees_every_document_regardless_of_categories() {
        let documents = vec![doc("a", ""), doc("b", "x"), doc("c", "y")];
        let visible = resolve_visible(Role::Admin, &documents, &[]);
        assert_eq!(visible.len(), documents.len());
    }

    #[test]
    fn resolved_set_is_a_subset_for_every_role() {
        let categories = vec![
            category("a", &[Role::Guest, Role::Engineer]),
            category("b", &[Role::Architect]),
        ];
        let documents = vec![
            doc("1", "a"),
            doc("2", "b").with_view_permissions([Role::Guest]),
            doc("3", "c"),
            doc("4", "b"),
        ];
        for role in Role::all() {
            let visible = resolve_visible(*role, &documents, &categories);
            assert!(visible.len() <= documents.len());
            for d in &visible {
                assert!(documents.iter().any(|x| x.id == d.id));
            }
            for d in &documents {
                if d.view_permissions.contains(role) {
                    assert!(visible.iter().any(|v| v.id == d.id));
                }
            }
        }
    }

    #[test]
    fn explain_reports_the_deciding_grant() {
        let categories = vec![category("a", &[Role::Guest])];
        let index = CategoryIndex::new(&categories);

        assert_eq!(
            explain(Role::Guest, &doc("1", "a"), &index),
            AccessDecision::Category
        );
        assert_eq!(
            explain(Role::Worker, &doc("1", "a"), &index),
            AccessDecision::NotGranted
        );
        assert_eq!(
            explain(Role::Worker, &doc("1", "zz"), &index),
            AccessDecision::Orphan
        );
        assert_eq!(
            explain(Role::Admin, &doc("1", "zz"), &index),
            AccessDecision::Admin
        );
    }

    #[test]
    fn download_requires_explicit_grant() {
        let d = doc("1", "a").with_download_permissions([Role::Engineer]);
        assert!(can_download(Role::Engineer, &d));
        assert!(can_download(Role::Admin, &d));
        assert!(!can_download(Role::Guest, &d));
    }

    #[test]
    fn visible_categories_respect_admin_bypass() {
        let categories = vec![category("a", &[Role::Guest]), category("b", &[])];
        assert_eq!(visible_categories(Role::Guest, &categories).len(), 1);
        assert_eq!(visible_categories(Role::Admin, &categories).len(), 2);
        assert!(visible_categories(Role::Worker, &categories).is_empty());
    }
}
