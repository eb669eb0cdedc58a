//! Catalog configuration: TOML file, `.env` and environment overrides.

pub mod loader;
pub mod models;
pub mod sources;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::CatalogConfig;
pub use sources::{EnvConfig, FileCatalogConfig, FileConfig};
