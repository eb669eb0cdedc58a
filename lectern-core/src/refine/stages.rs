//! The individual narrowing stages, each a pure retain over references.

use std::collections::BTreeSet;

use lectern_model::{Document, Role, TagId};

use crate::access::{CategoryIndex, can_view_document};
use crate::localize::{Localizer, display_title};

/// Stage 1: what the viewer may see at all.
pub fn access<'d>(
    viewer: Role,
    documents: &'d [Document],
    index: &CategoryIndex<'_>,
) -> Vec<&'d Document> {
    documents
        .iter()
        .filter(|doc| can_view_document(viewer, doc, index))
        .collect()
}

/// Stage 1b: category facet, used when the stream is not already scoped to
/// a single category. Empty selection keeps everything.
pub fn category_facet(documents: &mut Vec<&Document>, selected: &BTreeSet<String>) {
    if selected.is_empty() {
        return;
    }
    documents.retain(|doc| selected.contains(&doc.category_key));
}

/// Stage 2: case-insensitive substring over display title or description.
/// Blank queries keep everything.
pub fn search(
    documents: &mut Vec<&Document>,
    query: &str,
    localizer: &dyn Localizer,
) {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return;
    }
    documents.retain(|doc| {
        display_title(doc, localizer).to_lowercase().contains(&needle)
            || doc
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    });
}

/// Stage 3: every selected tag must be present.
pub fn tags(documents: &mut Vec<&Document>, selected: &BTreeSet<TagId>) {
    if selected.is_empty() {
        return;
    }
    documents.retain(|doc| selected.iter().all(|tag| doc.has_tag(tag)));
}

/// Stage 4: keep documents at least one selected target role could see,
/// by the same rule the viewer is judged by.
pub fn target_roles(
    documents: &mut Vec<&Document>,
    selected: &BTreeSet<Role>,
    index: &CategoryIndex<'_>,
) {
    if selected.is_empty() {
        return;
    }
    documents.retain(|doc| {
        selected
            .iter()
            .any(|role| can_view_document(*role, doc, index))
    });
}
