//! Configuration for repositories and the storage connection

use anyhow::{ensure, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix, e.g. `SERVICE_REPOSITORY_MAX_PER_PAGE=50`
pub const ENV_PREFIX: &str = "SERVICE_REPOSITORY_";

/// Repository configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Page size used when a request does not name one
    #[serde(default = "default_per_page")]
    pub default_per_page: u64,

    /// Upper bound every requested page size is clamped to
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u64,

    /// Database URL for the relational backend (e.g. `sqlite::memory:`)
    #[serde(default)]
    pub database_url: Option<String>,

    /// Connection pool size; driver default when absent
    #[serde(default)]
    pub max_connections: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
            database_url: None,
            max_connections: None,
        }
    }
}

impl Config {
    /// Layer defaults, an optional YAML file and `SERVICE_REPOSITORY_*`
    /// environment variables, in that order of precedence.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config: Config = figment.merge(Env::prefixed(ENV_PREFIX)).extract()?;
        config.validate()?;

        tracing::debug!(
            default_per_page = config.default_per_page,
            max_per_page = config.max_per_page,
            "Repository configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_per_page > 0, "max_per_page must be positive");
        ensure!(self.default_per_page > 0, "default_per_page must be positive");
        if let Some(max_connections) = self.max_connections {
            ensure!(max_connections > 0, "max_connections must be positive");
        }
        Ok(())
    }
}

fn default_per_page() -> u64 {
    15
}

fn default_max_per_page() -> u64 {
    100
}
