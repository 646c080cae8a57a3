use common::StoreError;
use plugin_core::PluginError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestorerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid invocation: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RestorerError>;
