use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URI: &str = "http://localhost/";
const DEFAULT_LOG_FILTER: &str = "info";

/// Environment variable naming the YAML config file.
pub const CONFIG_ENV: &str = "QLOADER_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read loader config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse base URI: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    base_uri: Option<String>,
    idle_timeout_ms: Option<u64>,
    log_filter: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub base_uri: Url,
    pub idle_timeout: Duration,
    pub log_filter: String,
}

impl LoaderConfig {
    /// Load from `config_path`; a missing path or file yields the defaults.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let raw = match config_path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)?;
                serde_yaml::from_str(&contents)?
            }
            _ => RawConfig::default(),
        };

        let base_uri = Url::parse(raw.base_uri.as_deref().unwrap_or(DEFAULT_BASE_URI))?;
        Ok(Self {
            base_uri,
            idle_timeout: Duration::from_millis(raw.idle_timeout_ms.unwrap_or(0)),
            log_filter: raw
                .log_filter
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }

    /// Load from the file named by [`CONFIG_ENV`], if set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
    }
}
