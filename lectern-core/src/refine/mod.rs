//! Client-side narrowing of the live document window.
//!
//! Stages run in a fixed order: access, category facet, search, tags,
//! target roles, sort. Access always runs first, so no later stage can
//! surface a document the viewer is not permitted to see.

pub mod sorting;
pub mod stages;

use std::collections::BTreeSet;
use std::sync::Arc;

use lectern_model::{Category, Document, Role, SortBy, TagId};
use tracing::trace;

use crate::access::CategoryIndex;
use crate::localize::Localizer;

pub use sorting::{
    TitleCollator, compare_recent, compare_titles, sort_documents,
};

/// Everything the pipeline output depends on besides the two collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefineFilters {
    pub viewer: Role,
    pub search: String,
    pub categories: BTreeSet<String>,
    pub tags: BTreeSet<TagId>,
    pub roles: BTreeSet<Role>,
    pub sort_by: SortBy,
}

impl RefineFilters {
    pub fn for_viewer(viewer: Role) -> Self {
        Self {
            viewer,
            search: String::new(),
            categories: BTreeSet::new(),
            tags: BTreeSet::new(),
            roles: BTreeSet::new(),
            sort_by: SortBy::default(),
        }
    }
}

/// Runs every stage and returns owned copies in display order.
pub fn refine(
    documents: &[Document],
    categories: &[Category],
    filters: &RefineFilters,
    localizer: &dyn Localizer,
) -> Vec<Document> {
    let index = CategoryIndex::new(categories);
    let mut visible = stages::access(filters.viewer, documents, &index);
    stages::category_facet(&mut visible, &filters.categories);
    stages::search(&mut visible, &filters.search, localizer);
    stages::tags(&mut visible, &filters.tags);
    stages::target_roles(&mut visible, &filters.roles, &index);
    sort_documents(&mut visible, filters.sort_by, localizer);
    visible.into_iter().cloned().collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MemoKey {
    documents_version: u64,
    categories_version: u64,
    filters: RefineFilters,
}

/// Memoizes [`refine`] on collection versions plus filters.
#[derive(Debug, Default)]
pub struct RefinePipeline {
    memo: Option<(MemoKey, Arc<Vec<Document>>)>,
    computations: u64,
}

impl RefinePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached output when neither collection version nor any
    /// filter changed since the last call.
    pub fn run(
        &mut self,
        documents: (&[Document], u64),
        categories: (&[Category], u64),
        filters: &RefineFilters,
        localizer: &dyn Localizer,
    ) -> Arc<Vec<Document>> {
        let key = MemoKey {
            documents_version: documents.1,
            categories_version: categories.1,
            filters: filters.clone(),
        };
        if let Some((cached_key, cached)) = &self.memo
            && *cached_key == key
        {
            return Arc::clone(cached);
        }

        let output = Arc::new(refine(documents.0, categories.0, filters, localizer));
        self.computations += 1;
        trace!(
            documents = documents.0.len(),
            visible = output.len(),
            computations = self.computations,
            "refined document window"
        );
        self.memo = Some((key, Arc::clone(&output)));
        output
    }

    /// Number of times the stages actually ran.
    pub fn computations(&self) -> u64 {
        self.computations
    }

    /// Forces the next [`run`](Self::run) to recompute, e.g. after the
    /// active locale changed.
    pub fn invalidate(&mut self) {
        self.memo = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localize::NoTranslations;
    use chrono::{TimeZone, Utc};
    use lectern_model::{CategoryId, DocumentId};

    fn catalog() -> (Vec<Category>, Vec<Document>) {
        let categories = vec![
            Category::new(CategoryId::new("c1").unwrap(), "armoplit", [Role::Foreman]),
            Category::new(CategoryId::new("c2").unwrap(), "payroll", [Role::Hr]),
        ];
        let at = |s| Utc.timestamp_opt(s, 0).unwrap();
        let documents = vec![
            Document::new(DocumentId::new("d1").unwrap(), "armoplit")
                .with_title("Mixing guide")
                .with_tags([TagId::new("safety").unwrap()])
                .with_updated_at(at(10)),
            Document::new(DocumentId::new("d2").unwrap(), "armoplit")
                .with_title("Curing times")
                .with_updated_at(at(20)),
            Document::new(DocumentId::new("d3").unwrap(), "payroll")
                .with_title("Salary bands")
                .with_updated_at(at(30)),
            Document::new(DocumentId::new("d4").unwrap(), "payroll")
                .with_title("Site payroll calendar")
                .with_view_permissions([Role::Foreman])
                .with_updated_at(at(5)),
        ];
        (categories, documents)
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn access_runs_before_everything_else() {
        let (categories, documents) = catalog();
        let filters = RefineFilters::for_viewer(Role::Foreman);
        let out = refine(&documents, &categories, &filters, &NoTranslations);
        assert_eq!(ids(&out), vec!["d2", "d1", "d4"]);

        let mut searching = filters.clone();
        searching.search = "salary".into();
        assert!(refine(&documents, &categories, &searching, &NoTranslations).is_empty());
    }

    #[test]
    fn stages_compose() {
        let (categories, documents) = catalog();
        let mut filters = RefineFilters::for_viewer(Role::Admin);
        filters.roles = BTreeSet::from([Role::Foreman]);
        filters.search = "  I  ".into();
        filters.sort_by = SortBy::Alpha;

        let out = refine(&documents, &categories, &filters, &NoTranslations);
        assert_eq!(ids(&out), vec!["d2", "d1", "d4"]);

        filters.tags = BTreeSet::from([TagId::new("safety").unwrap()]);
        let out = refine(&documents, &categories, &filters, &NoTranslations);
        assert_eq!(ids(&out), vec!["d1"]);
    }

    #[test]
    fn pipeline_recomputes_only_on_change() {
        let (categories, documents) = catalog();
        let mut pipeline = RefinePipeline::new();
        let mut filters = RefineFilters::for_viewer(Role::Admin);
        let docs = |version| (&documents[..], version);
        let cats = (&categories[..], 1);

        let first = pipeline.run(docs(1), cats, &filters, &NoTranslations);
        let second = pipeline.run(docs(1), cats, &filters, &NoTranslations);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(pipeline.computations(), 1);

        pipeline.run(docs(2), cats, &filters, &NoTranslations);
        assert_eq!(pipeline.computations(), 2);

        filters.search = "guide".into();
        let narrowed = pipeline.run(docs(2), cats, &filters, &NoTranslations);
        assert_eq!(ids(&narrowed), vec!["d1"]);
        assert_eq!(pipeline.computations(), 3);

        pipeline.invalidate();
        pipeline.run(docs(2), cats, &filters, &NoTranslations);
        assert_eq!(pipeline.computations(), 4);
    }
}
