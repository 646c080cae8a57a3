use std::path::Path;
use std::sync::Arc;

use common::SnapshotStore;
use config::{Config, Environment, File};
use serde::Deserialize;

pub use common::config::{StoreAppConfig, StoreBackend};

use crate::actions::DEFAULT_CONTENT_NAME_PREFIX;
use crate::error::Result;

/// Static binding settings.
#[derive(Debug, Deserialize, Clone)]
pub struct BinderConfig {
    /// Prefix of generated VolumeSnapshotContent names. Default: "velero-".
    #[serde(default = "default_content_name_prefix")]
    pub content_name_prefix: String,
}

fn default_content_name_prefix() -> String {
    DEFAULT_CONTENT_NAME_PREFIX.into()
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            content_name_prefix: default_content_name_prefix(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset. Default: "info".
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RunnerConfig {
    /// Per-invocation deadline in seconds; 0 disables it. Default: 30.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Restorer application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RestorerAppConfig {
    #[serde(default)]
    pub binder: BinderConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub store: StoreAppConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
}

impl RestorerAppConfig {
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("CSI_RESTORE_CONFIG").unwrap_or_else(|_| "config/restorer".to_string());
        Self::load_from(config_path)
    }

    /// Defaults, then the (optional) file at `path`, then `CSI_RESTORE__*` overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_string_lossy();

        let s = Config::builder()
            .set_default("binder.content_name_prefix", DEFAULT_CONTENT_NAME_PREFIX)?
            .set_default("log.filter", "info")?
            .set_default("store.backend", "memory")?
            .set_default("store.root", "./data/store")?
            .set_default("runner.timeout_secs", 30_i64)?
            .add_source(File::with_name(&path).required(false))
            .add_source(Environment::with_prefix("CSI_RESTORE").separator("__"))
            .build()?;

        Ok(s.try_deserialize()?)
    }

    /// Open the configured snapshot store backend.
    pub async fn open_store(&self) -> Result<Arc<dyn SnapshotStore>> {
        Ok(self.store.open().await?)
    }
}
