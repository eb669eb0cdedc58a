use std::collections::BTreeSet;

use lectern_core::access::{AccessDecision, CategoryIndex, explain, resolve_visible};
use lectern_core::localize::NoTranslations;
use lectern_core::refine::{RefineFilters, refine};
use lectern_model::{Category, CategoryId, Document, DocumentId, Role};

/// Every combination of category grant, own grant and dangling key, for
/// every role.
fn corpus() -> (Vec<Category>, Vec<Document>) {
    let categories: Vec<Category> = Role::all()
        .iter()
        .map(|role| {
            Category::new(
                CategoryId::new(format!("c-{role}")).unwrap(),
                format!("categories.{role}"),
                [*role],
            )
        })
        .chain(std::iter::once(Category::new(
            CategoryId::new("c-closed").unwrap(),
            "categories.closed",
            std::iter::empty(),
        )))
        .collect();

    let mut documents = Vec::new();
    let keys = categories
        .iter()
        .map(|c| c.name_key.clone())
        .chain(std::iter::once("categories.missing".to_string()));
    for (k, key) in keys.enumerate() {
        for (r, role) in Role::all().iter().enumerate() {
            documents.push(
                Document::new(DocumentId::new(format!("d{k}-{r}")).unwrap(), &key)
                    .with_view_permissions([*role]),
            );
        }
        documents.push(Document::new(
            DocumentId::new(format!("d{k}-none")).unwrap(),
            &key,
        ));
    }
    (categories, documents)
}

#[test]
fn visible_set_is_a_subset_of_the_input() {
    let (categories, documents) = corpus();
    let all: BTreeSet<_> = documents.iter().map(|d| d.id.clone()).collect();
    for role in Role::all() {
        let visible = resolve_visible(*role, &documents, &categories);
        assert!(visible.iter().all(|d| all.contains(&d.id)));
        assert!(visible.len() <= documents.len());
    }
}

#[test]
fn own_view_permission_always_grants() {
    let (categories, documents) = corpus();
    for role in Role::all() {
        let visible: BTreeSet<_> = resolve_visible(*role, &documents, &categories)
            .into_iter()
            .map(|d| d.id.clone())
            .collect();
        for doc in documents.iter().filter(|d| d.view_permissions.contains(role)) {
            assert!(visible.contains(&doc.id), "{role} should see {}", doc.id);
        }
    }
}

#[test]
fn admin_sees_everything() {
    let (categories, documents) = corpus();
    let visible = resolve_visible(Role::Admin, &documents, &categories);
    assert_eq!(visible.len(), documents.len());
}

#[test]
fn orphans_are_admin_only_unless_self_granted() {
    let (categories, documents) = corpus();
    let index = CategoryIndex::new(&categories);
    let orphans = documents
        .iter()
        .filter(|d| d.category_key == "categories.missing");

    for doc in orphans {
        for role in Role::all().iter().filter(|r| !r.is_admin()) {
            let decision = explain(*role, doc, &index);
            if doc.view_permissions.contains(role) {
                assert_eq!(decision, AccessDecision::Document);
            } else {
                assert_eq!(decision, AccessDecision::Orphan);
            }
        }
    }
}

#[test]
fn later_stages_never_widen_access() {
    let (categories, documents) = corpus();
    for role in Role::all() {
        let allowed: BTreeSet<_> = resolve_visible(*role, &documents, &categories)
            .into_iter()
            .map(|d| d.id.clone())
            .collect();

        let mut filters = RefineFilters::for_viewer(*role);
        filters.roles = Role::all().iter().copied().collect();
        let refined = refine(&documents, &categories, &filters, &NoTranslations);

        assert!(refined.iter().all(|d| allowed.contains(&d.id)));
        assert_eq!(refined.len(), allowed.len());
    }
}

#[test]
fn foreman_example() {
    let categories = vec![Category::new(
        CategoryId::new("c1").unwrap(),
        "categories.armoplit",
        [Role::Foreman],
    )];
    let documents = vec![
        Document::new(DocumentId::new("d1").unwrap(), "categories.armoplit"),
        Document::new(DocumentId::new("d2").unwrap(), "categories.fixit"),
    ];

    let ids = |role| {
        resolve_visible(role, &documents, &categories)
            .into_iter()
            .map(|d| d.id.as_str().to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(Role::Foreman), vec!["d1"]);
    assert_eq!(ids(Role::Admin), vec!["d1", "d2"]);
}
