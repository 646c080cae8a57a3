use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::error::StoreError;
use super::names::{GENERATE_NAME_ATTEMPTS, NameRequest, stamp};
use super::traits::SnapshotStore;
use crate::snapshot::{
    VOLUME_SNAPSHOT_CONTENT_KIND, VOLUME_SNAPSHOT_KIND, VolumeSnapshot, VolumeSnapshotContent,
};

#[derive(Default)]
struct State {
    snapshots: HashMap<(String, String), VolumeSnapshot>,
    contents: BTreeMap<String, VolumeSnapshotContent>,
    revision: u64,
}

impl State {
    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }
}

/// In-process snapshot store.
///
/// Every create checks and inserts under a single write lock, so two
/// concurrent creates of the same identity cannot both succeed.
#[derive(Default)]
pub struct MemorySnapshotStore {
    state: RwLock<State>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored VolumeSnapshotContents.
    pub async fn content_count(&self) -> usize {
        self.state.read().await.contents.len()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn get_volume_snapshot(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<VolumeSnapshot>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .snapshots
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn create_volume_snapshot(
        &self,
        snapshot: &VolumeSnapshot,
    ) -> Result<VolumeSnapshot, StoreError> {
        let request = NameRequest::from_meta(&snapshot.metadata, VOLUME_SNAPSHOT_KIND)?;
        let namespace = snapshot.metadata.namespace.clone();
        let mut state = self.state.write().await;

        for _ in 0..GENERATE_NAME_ATTEMPTS {
            let key = (namespace.clone(), request.candidate());
            if state.snapshots.contains_key(&key) {
                if request.is_generated() {
                    continue;
                }
                return Err(StoreError::already_exists(
                    VOLUME_SNAPSHOT_KIND,
                    format!("{}/{}", key.0, key.1),
                ));
            }

            let mut stored = snapshot.clone();
            let revision = state.next_revision();
            stamp(&mut stored.metadata, key.1.clone(), revision);
            state.snapshots.insert(key, stored.clone());
            return Ok(stored);
        }

        Err(StoreError::Unavailable(format!(
            "could not generate a unique {VOLUME_SNAPSHOT_KIND} name"
        )))
    }

    async fn get_volume_snapshot_content(
        &self,
        name: &str,
    ) -> Result<Option<VolumeSnapshotContent>, StoreError> {
        Ok(self.state.read().await.contents.get(name).cloned())
    }

    async fn create_volume_snapshot_content(
        &self,
        content: &VolumeSnapshotContent,
    ) -> Result<VolumeSnapshotContent, StoreError> {
        let request = NameRequest::from_meta(&content.metadata, VOLUME_SNAPSHOT_CONTENT_KIND)?;
        let mut state = self.state.write().await;

        for _ in 0..GENERATE_NAME_ATTEMPTS {
            let name = request.candidate();
            if state.contents.contains_key(&name) {
                if request.is_generated() {
                    continue;
                }
                return Err(StoreError::already_exists(VOLUME_SNAPSHOT_CONTENT_KIND, name));
            }

            let mut stored = content.clone();
            let revision = state.next_revision();
            stamp(&mut stored.metadata, name.clone(), revision);
            state.contents.insert(name, stored.clone());
            return Ok(stored);
        }

        Err(StoreError::Unavailable(format!(
            "could not generate a unique {VOLUME_SNAPSHOT_CONTENT_KIND} name"
        )))
    }

    async fn list_volume_snapshot_contents(
        &self,
    ) -> Result<Vec<VolumeSnapshotContent>, StoreError> {
        Ok(self.state.read().await.contents.values().cloned().collect())
    }
}
