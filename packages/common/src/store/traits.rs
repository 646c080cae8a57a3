use async_trait::async_trait;

use super::error::StoreError;
use crate::snapshot::{VolumeSnapshot, VolumeSnapshotContent};

/// Read/create access to snapshot objects in the destination cluster.
///
/// Implementations must make `create_*` reject a second object with the same
/// identity; callers rely on that as the final guard against duplicates.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Fetch a VolumeSnapshot, or `None` if it does not exist.
    async fn get_volume_snapshot(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<VolumeSnapshot>, StoreError>;

    /// Check whether a VolumeSnapshot exists.
    async fn volume_snapshot_exists(&self, namespace: &str, name: &str) -> Result<bool, StoreError> {
        Ok(self.get_volume_snapshot(namespace, name).await?.is_some())
    }

    /// Persist a new VolumeSnapshot and return it as stored.
    async fn create_volume_snapshot(
        &self,
        snapshot: &VolumeSnapshot,
    ) -> Result<VolumeSnapshot, StoreError>;

    /// Fetch a VolumeSnapshotContent, or `None` if it does not exist.
    async fn get_volume_snapshot_content(
        &self,
        name: &str,
    ) -> Result<Option<VolumeSnapshotContent>, StoreError>;

    /// Persist a new VolumeSnapshotContent and return it as stored.
    ///
    /// When `metadata.name` is empty the store assigns one from
    /// `metadata.generateName`; the returned object carries the final name.
    async fn create_volume_snapshot_content(
        &self,
        content: &VolumeSnapshotContent,
    ) -> Result<VolumeSnapshotContent, StoreError>;

    /// List every VolumeSnapshotContent, ordered by name.
    async fn list_volume_snapshot_contents(&self)
    -> Result<Vec<VolumeSnapshotContent>, StoreError>;
}
