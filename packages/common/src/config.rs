use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::store::{FilesystemSnapshotStore, MemorySnapshotStore, SnapshotStore, StoreError};

/// Which snapshot store backend to open.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local store; contents are lost on exit.
    #[default]
    Memory,
    /// JSON documents under `root`.
    Filesystem,
}

/// App-level store configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreAppConfig {
    /// Backend to use. Default: "memory".
    #[serde(default)]
    pub backend: StoreBackend,
    /// Root directory of the filesystem backend. Default: "./data/store".
    #[serde(default = "default_store_root")]
    pub root: PathBuf,
}

fn default_store_root() -> PathBuf {
    PathBuf::from("./data/store")
}

impl Default for StoreAppConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            root: default_store_root(),
        }
    }
}

impl StoreAppConfig {
    /// Open the configured backend.
    pub async fn open(&self) -> Result<Arc<dyn SnapshotStore>, StoreError> {
        match self.backend {
            StoreBackend::Memory => Ok(Arc::new(MemorySnapshotStore::new())),
            StoreBackend::Filesystem => Ok(Arc::new(
                FilesystemSnapshotStore::new(self.root.clone()).await?,
            )),
        }
    }
}
