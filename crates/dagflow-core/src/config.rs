//! C7: file-based configuration for the substrate adapter.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Errors raised while loading or validating a `dagflow.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("substrate.default_timeout_seconds must be > 0")]
    ZeroTimeout,

    #[error("substrate.max_concurrency must be > 0")]
    ZeroConcurrency,
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level config, loaded from `dagflow.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DagflowConfig {
    pub substrate: SubstrateConfig,
}

impl DagflowConfig {
    /// Load config from a specific `dagflow.toml` path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `./dagflow.toml` if it exists, otherwise fall back to defaults.
    pub fn load_or_default() -> Self {
        let path = PathBuf::from("dagflow.toml");
        if path.exists() {
            match Self::load(&path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!(%e, "failed to load dagflow.toml, falling back to defaults");
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.substrate.default_timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.substrate.max_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

/// Settings for the reference in-process substrate: the registry's default
/// per-step timeout and how many steps it will run concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubstrateConfig {
    pub default_timeout_seconds: u64,
    pub max_concurrency: usize,
}

impl Default for SubstrateConfig {
    fn default() -> Self {
        Self {
            default_timeout_seconds: 30,
            max_concurrency: 8,
        }
    }
}
