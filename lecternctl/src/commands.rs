use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use lectern_core::access::{CategoryIndex, can_download, explain as explain_access};
use lectern_core::config::ConfigLoader;
use lectern_core::controller::CatalogController;
use lectern_core::localize::StaticTranslations;
use lectern_core::store::InMemoryStore;
use lectern_core::store::decode::RawCatalog;
use lectern_model::{Role, SortBy};
use serde_json::json;
use tracing::info;

#[derive(Debug)]
pub struct BrowseArgs {
    pub fixture: PathBuf,
    pub role: Role,
    pub query: String,
    pub sort: Option<SortBy>,
    pub config: Option<PathBuf>,
    pub translations: Option<PathBuf>,
    pub strict: bool,
}

fn read(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} {}", path.display()))
}

pub fn browse(args: BrowseArgs) -> Result<String> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_config_path(path);
    }
    let config = loader
        .load()
        .context("failed to load catalog configuration")?
        .config;

    let store = InMemoryStore::from_json(&read(&args.fixture, "fixture")?)
        .context("fixture is not a catalog export")?;

    let mut catalog =
        CatalogController::new(Arc::new(store), config, args.role);
    if let Some(path) = &args.translations {
        let entries: HashMap<String, String> =
            serde_json::from_str(&read(path, "translations")?)
                .context("translations must be a JSON object of strings")?;
        catalog.set_localizer(Arc::new(StaticTranslations::new(entries)));
    }
    if let Some(sort) = args.sort {
        catalog.set_sort(sort);
    }
    if args.strict {
        catalog
            .try_apply_query_string(&args.query)
            .context("invalid query string")?;
    } else {
        catalog.apply_query_string(&args.query);
    }

    let applied = catalog.pump();
    info!(applied, "catalog settled");

    let view = catalog.view();
    Ok(serde_json::to_string_pretty(&view)?)
}

pub fn explain(fixture: &Path, role: Role) -> Result<String> {
    let raw: RawCatalog = serde_json::from_str(&read(fixture, "fixture")?)
        .context("fixture is not a catalog export")?;
    let catalog = raw.decode();
    let index = CategoryIndex::new(&catalog.categories);

    let rows: Vec<_> = catalog
        .documents
        .iter()
        .map(|document| {
            let decision = explain_access(role, document, &index);
            json!({
                "id": document.id,
                "categoryKey": document.category_key,
                "visible": decision.is_granted(),
                "reason": decision.as_str(),
                "canDownload": can_download(role, document),
            })
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

pub fn roles() -> String {
    Role::all()
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}
