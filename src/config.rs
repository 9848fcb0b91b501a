// src/config.rs

use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const DEFAULT_SOURCE_URL: &str = "https://data.gov.sg/api/action/datastore_search";
pub const DEFAULT_RESOURCE_ID: &str = "f1765b54-a209-4718-8d38-a39237f502b3";
pub const DEFAULT_CACHE_PATH: &str = "hdb_data.parquet";

pub const ENV_USE_NETWORK: &str = "HDB_USE_NETWORK";
pub const ENV_CACHE_PATH: &str = "HDB_CACHE_PATH";
pub const ENV_SOURCE_URL: &str = "HDB_SOURCE_URL";
pub const ENV_PAGE_LIMIT: &str = "HDB_PAGE_LIMIT";
pub const ENV_PAGE_DELAY_MS: &str = "HDB_PAGE_DELAY_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid source URL: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

/// How the processor obtains its table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Try the remote API before falling back to the cache.
    pub use_network: bool,
    /// Cache location; the extension picks the format.
    pub cache_path: PathBuf,
    pub source: SourceConfig,
}

/// The paginated remote endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: Url,
    pub resource_id: String,
    /// Records requested per page.
    pub page_limit: usize,
    /// Pause between successful pages.
    pub page_delay_ms: u64,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            use_network: true,
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            source: SourceConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: Url::parse(DEFAULT_SOURCE_URL).expect("default source URL should parse"),
            resource_id: DEFAULT_RESOURCE_ID.to_string(),
            page_limit: 10_000,
            page_delay_ms: 300,
            timeout_secs: 30,
        }
    }
}

impl SourceConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ProcessorConfig {
    /// Cache-only configuration at `cache_path`.
    pub fn offline(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            use_network: false,
            cache_path: cache_path.into(),
            ..Self::default()
        }
    }

    /// Defaults, then the YAML file at `path` (if given), then `HDB_*`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&text)?;
        config.validate()?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Apply `HDB_*` overrides using `lookup` to resolve variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_USE_NETWORK) {
            self.use_network = parse_bool(ENV_USE_NETWORK, &v)?;
        }
        if let Some(v) = lookup(ENV_CACHE_PATH) {
            self.cache_path = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_SOURCE_URL) {
            self.source.url = Url::parse(&v)?;
        }
        if let Some(v) = lookup(ENV_PAGE_LIMIT) {
            self.source.page_limit = parse_num(ENV_PAGE_LIMIT, &v)?;
        }
        if let Some(v) = lookup(ENV_PAGE_DELAY_MS) {
            self.source.page_delay_ms = parse_num(ENV_PAGE_DELAY_MS, &v)?;
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.source.page_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "page_limit".into(),
                value: "0".into(),
            });
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.into(),
            value: value.into(),
        }),
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.into(),
        value: value.into(),
    })
}
