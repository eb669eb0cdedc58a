use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info, warn};

use lectern_model::SortBy;

use super::{
    models::CatalogConfig,
    sources::{EnvConfig, FileConfig},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("lectern.toml"),
        PathBuf::from("config/lectern.toml"),
    ]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

/// Outcome of a successful load.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: CatalogConfig,
    /// File the values came from, if any.
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Loads `.env`, reads the process environment, then resolves.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_env_file()?;
        let mut load = self.load_with_env(EnvConfig::gather())?;
        load.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Resolves against an already gathered environment; never touches the
    /// process environment or `.env`.
    pub fn load_with_env(
        &self,
        env: EnvConfig,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        let mut warnings = Vec::new();
        if config_path.is_none() {
            warnings.push(
                "No lectern.toml detected; using defaults and environment"
                    .to_string(),
            );
        }

        let config = compose_config(file_config.unwrap_or_default(), env)?;
        validate(&config)?;

        for warning in &warnings {
            warn!("{warning}");
        }
        info!(
            page_size = config.page_size,
            fetch_limit = config.fetch_limit,
            default_sort = %config.default_sort,
            source = ?config_path,
            "catalog configuration loaded"
        );

        Ok(ConfigLoad {
            config,
            config_path,
            env_file_loaded: false,
            warnings,
        })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        let loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };
        match loaded {
            Ok(loaded) => Ok(loaded),
            Err(dotenvy::Error::Io(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let (path, explicit) = match (&self.options.config_path, &env.config_path)
        {
            (Some(path), _) | (None, Some(path)) => (path.clone(), true),
            (None, None) => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
            {
                Some(path) => (path.clone(), false),
                None => return Ok((None, None)),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        debug!(path = %path.display(), "reading catalog configuration");
        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|err| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
    toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source: err,
    })
}

/// Environment wins over file, file wins over defaults.
fn compose_config(
    file: FileConfig,
    env: EnvConfig,
) -> Result<CatalogConfig, ConfigLoadError> {
    let defaults = CatalogConfig::default();
    let catalog = file.catalog;

    let default_sort = match env.default_sort.or(catalog.default_sort) {
        Some(raw) => raw.parse::<SortBy>().map_err(|_| {
            ConfigLoadError::InvalidValue {
                key: "default_sort",
                value: raw,
            }
        })?,
        None => defaults.default_sort,
    };

    Ok(CatalogConfig {
        page_size: env
            .page_size
            .or(catalog.page_size)
            .unwrap_or(defaults.page_size),
        fetch_limit: env
            .fetch_limit
            .or(catalog.fetch_limit)
            .unwrap_or(defaults.fetch_limit),
        default_sort,
    })
}

fn validate(config: &CatalogConfig) -> Result<(), ConfigLoadError> {
    if config.page_size == 0 {
        return Err(ConfigLoadError::OutOfRange {
            field: "page_size",
        });
    }
    if config.fetch_limit == 0 {
        return Err(ConfigLoadError::OutOfRange {
            field: "fetch_limit",
        });
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("{field} must be at least 1")]
    OutOfRange { field: &'static str },
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
