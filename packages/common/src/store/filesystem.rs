use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::debug;

use super::error::StoreError;
use super::names::{GENERATE_NAME_ATTEMPTS, NameRequest, stamp};
use super::traits::SnapshotStore;
use crate::snapshot::{
    VOLUME_SNAPSHOT_CONTENT_KIND, VOLUME_SNAPSHOT_KIND, VolumeSnapshot, VolumeSnapshotContent,
};

const SNAPSHOTS_DIR: &str = "volumesnapshots";
const CONTENTS_DIR: &str = "volumesnapshotcontents";

/// Filesystem-backed snapshot store.
///
/// Objects are stored as JSON documents:
/// `{base_path}/volumesnapshots/{namespace}/{name}.json` and
/// `{base_path}/volumesnapshotcontents/{name}.json`.
///
/// Creates write a temporary file and hard-link it into place, which fails if
/// the target exists, so a duplicate create never overwrites a stored object.
pub struct FilesystemSnapshotStore {
    base_path: PathBuf,
}

impl FilesystemSnapshotStore {
    /// Open (or initialise) a store rooted at `base_path`.
    pub async fn new(base_path: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(base_path.join(SNAPSHOTS_DIR)).await?;
        fs::create_dir_all(base_path.join(CONTENTS_DIR)).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        debug!(path = %base_path.display(), "Opened filesystem snapshot store");
        Ok(Self { base_path })
    }

    fn snapshot_path(&self, namespace: &str, name: &str) -> Result<PathBuf, StoreError> {
        Ok(self
            .base_path
            .join(SNAPSHOTS_DIR)
            .join(path_segment(namespace)?)
            .join(format!("{}.json", path_segment(name)?)))
    }

    fn content_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        Ok(self
            .base_path
            .join(CONTENTS_DIR)
            .join(format!("{}.json", path_segment(name)?)))
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Writes `object` to `path` unless something is already there.
    ///
    /// Returns `false` when the target exists.
    async fn create_exclusive<T: Serialize>(
        &self,
        path: &Path,
        object: &T,
    ) -> Result<bool, StoreError> {
        let bytes = serde_json::to_vec_pretty(object)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, &bytes).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        let linked = fs::hard_link(&temp_path, path).await;
        let _ = fs::remove_file(&temp_path).await;
        match linked {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "Object already exists");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Rejects names that would escape their directory.
fn path_segment(segment: &str) -> Result<&str, StoreError> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
    {
        return Err(StoreError::InvalidRequest(format!(
            "invalid object name segment '{segment}'"
        )));
    }
    Ok(segment)
}

async fn read_object<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl SnapshotStore for FilesystemSnapshotStore {
    async fn get_volume_snapshot(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<VolumeSnapshot>, StoreError> {
        read_object(&self.snapshot_path(namespace, name)?).await
    }

    async fn create_volume_snapshot(
        &self,
        snapshot: &VolumeSnapshot,
    ) -> Result<VolumeSnapshot, StoreError> {
        let request = NameRequest::from_meta(&snapshot.metadata, VOLUME_SNAPSHOT_KIND)?;
        let namespace = &snapshot.metadata.namespace;

        for _ in 0..GENERATE_NAME_ATTEMPTS {
            let name = request.candidate();
            let path = self.snapshot_path(namespace, &name)?;

            let mut stored = snapshot.clone();
            stamp(&mut stored.metadata, name.clone(), 1);
            if self.create_exclusive(&path, &stored).await? {
                return Ok(stored);
            }
            if !request.is_generated() {
                return Err(StoreError::already_exists(
                    VOLUME_SNAPSHOT_KIND,
                    format!("{namespace}/{name}"),
                ));
            }
        }

        Err(StoreError::Unavailable(format!(
            "could not generate a unique {VOLUME_SNAPSHOT_KIND} name"
        )))
    }

    async fn get_volume_snapshot_content(
        &self,
        name: &str,
    ) -> Result<Option<VolumeSnapshotContent>, StoreError> {
        read_object(&self.content_path(name)?).await
    }

    async fn create_volume_snapshot_content(
        &self,
        content: &VolumeSnapshotContent,
    ) -> Result<VolumeSnapshotContent, StoreError> {
        let request = NameRequest::from_meta(&content.metadata, VOLUME_SNAPSHOT_CONTENT_KIND)?;

        for _ in 0..GENERATE_NAME_ATTEMPTS {
            let name = request.candidate();
            let path = self.content_path(&name)?;

            let mut stored = content.clone();
            stamp(&mut stored.metadata, name.clone(), 1);
            if self.create_exclusive(&path, &stored).await? {
                return Ok(stored);
            }
            if !request.is_generated() {
                return Err(StoreError::already_exists(VOLUME_SNAPSHOT_CONTENT_KIND, name));
            }
        }

        Err(StoreError::Unavailable(format!(
            "could not generate a unique {VOLUME_SNAPSHOT_CONTENT_KIND} name"
        )))
    }

    async fn list_volume_snapshot_contents(
        &self,
    ) -> Result<Vec<VolumeSnapshotContent>, StoreError> {
        let mut entries = fs::read_dir(self.base_path.join(CONTENTS_DIR)).await?;
        let mut contents = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(content) = read_object::<VolumeSnapshotContent>(&path).await? {
                contents.push(content);
            }
        }

        contents.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        Ok(contents)
    }
}
