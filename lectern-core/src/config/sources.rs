use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_CONFIG_PATH: &str = "LECTERN_CONFIG";
pub const ENV_PAGE_SIZE: &str = "LECTERN_PAGE_SIZE";
pub const ENV_FETCH_LIMIT: &str = "LECTERN_FETCH_LIMIT";
pub const ENV_DEFAULT_SORT: &str = "LECTERN_DEFAULT_SORT";

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub catalog: FileCatalogConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCatalogConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_sort: Option<String>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub page_size: Option<usize>,
    pub fetch_limit: Option<usize>,
    pub default_sort: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            config_path: std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from),
            page_size: parse_number_var(ENV_PAGE_SIZE),
            fetch_limit: parse_number_var(ENV_FETCH_LIMIT),
            default_sort: std::env::var(ENV_DEFAULT_SORT)
                .ok()
                .filter(|raw| !raw.trim().is_empty()),
        }
    }
}

fn parse_number_var(name: &str) -> Option<usize> {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
}
