use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::label::VSC_DELETION_POLICY_ANNOTATION;
use crate::meta::{ObjectMeta, ObjectReference};

pub const SNAPSHOT_API_GROUP: &str = "snapshot.storage.k8s.io";
pub const SNAPSHOT_API_VERSION: &str = "snapshot.storage.k8s.io/v1";

pub const VOLUME_SNAPSHOT_KIND: &str = "VolumeSnapshot";
pub const VOLUME_SNAPSHOT_CONTENT_KIND: &str = "VolumeSnapshotContent";
pub const VOLUME_SNAPSHOT_CLASS_KIND: &str = "VolumeSnapshotClass";

pub const VOLUME_SNAPSHOTS_RESOURCE: &str = "volumesnapshots.snapshot.storage.k8s.io";
pub const VOLUME_SNAPSHOT_CONTENTS_RESOURCE: &str = "volumesnapshotcontents.snapshot.storage.k8s.io";
pub const VOLUME_SNAPSHOT_CLASSES_RESOURCE: &str = "volumesnapshotclasses.snapshot.storage.k8s.io";
/// Core resource holding a class's snapshotter credentials.
pub const SECRETS_RESOURCE: &str = "secrets";

fn default_api_version() -> String {
    SNAPSHOT_API_VERSION.into()
}
fn default_snapshot_kind() -> String {
    VOLUME_SNAPSHOT_KIND.into()
}
fn default_content_kind() -> String {
    VOLUME_SNAPSHOT_CONTENT_KIND.into()
}
fn default_class_kind() -> String {
    VOLUME_SNAPSHOT_CLASS_KIND.into()
}

/// What happens to the storage-side snapshot when its content object is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeletionPolicy {
    #[default]
    Delete,
    Retain,
}

impl DeletionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "Delete",
            Self::Retain => "Retain",
        }
    }
}

impl fmt::Display for DeletionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time snapshot request and its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshot {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_snapshot_kind")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: VolumeSnapshotSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotSpec {
    #[serde(default)]
    pub source: VolumeSnapshotSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_snapshot_class_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Where a snapshot comes from. Exactly one field is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotSource {
    /// Dynamic source: snapshot the named claim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim_name: Option<String>,
    /// Static source: bind to the named pre-existing content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_snapshot_content_name: Option<String>,
}

impl VolumeSnapshotSource {
    pub fn from_claim(claim: impl Into<String>) -> Self {
        Self {
            persistent_volume_claim_name: Some(claim.into()),
            volume_snapshot_content_name: None,
        }
    }

    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            persistent_volume_claim_name: None,
            volume_snapshot_content_name: Some(content.into()),
        }
    }

    /// Name of the content this source binds to, if it is a static source.
    pub fn content_name(&self) -> Option<&str> {
        match (&self.persistent_volume_claim_name, &self.volume_snapshot_content_name) {
            (None, Some(content)) => Some(content.as_str()),
            _ => None,
        }
    }
}

impl VolumeSnapshot {
    pub fn new(metadata: ObjectMeta, spec: VolumeSnapshotSpec) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_snapshot_kind(),
            metadata,
            spec,
            status: None,
        }
    }

    /// Rebinds this snapshot to the content named `content_name`.
    ///
    /// The dynamic claim source is dropped and the deletion-policy annotation
    /// is set to `Retain` to mirror the content's policy, so deleting the
    /// restored snapshot later never removes the storage-side handle.
    pub fn into_statically_bound(mut self, namespace: &str, content_name: &str) -> Self {
        self.metadata.namespace = namespace.to_string();
        self.spec.source = VolumeSnapshotSource::from_content(content_name);
        self.metadata.annotations.insert(
            VSC_DELETION_POLICY_ANNOTATION.to_string(),
            DeletionPolicy::Retain.to_string(),
        );
        self
    }
}

impl Default for VolumeSnapshot {
    fn default() -> Self {
        Self::new(ObjectMeta::default(), VolumeSnapshotSpec::default())
    }
}

/// Binding between a VolumeSnapshot and a storage-side snapshot handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotContent {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_content_kind")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: VolumeSnapshotContentSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotContentSpec {
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub volume_snapshot_ref: ObjectReference,
    #[serde(default)]
    pub source: VolumeSnapshotContentSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_snapshot_class_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotContentSource {
    /// Pre-existing storage-side snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_handle: Option<String>,
    /// Volume to take a new snapshot of.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_handle: Option<String>,
}

impl VolumeSnapshotContentSource {
    pub fn from_snapshot_handle(handle: impl Into<String>) -> Self {
        Self {
            snapshot_handle: Some(handle.into()),
            volume_handle: None,
        }
    }
}

impl VolumeSnapshotContent {
    pub fn new(metadata: ObjectMeta, spec: VolumeSnapshotContentSpec) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_content_kind(),
            metadata,
            spec,
            status: None,
        }
    }

    /// The storage handle of a statically provisioned content.
    pub fn static_snapshot_handle(&self) -> Option<&str> {
        match &self.spec.source {
            VolumeSnapshotContentSource {
                snapshot_handle: Some(handle),
                volume_handle: None,
            } => Some(handle.as_str()),
            _ => None,
        }
    }
}

impl Default for VolumeSnapshotContent {
    fn default() -> Self {
        Self::new(ObjectMeta::default(), VolumeSnapshotContentSpec::default())
    }
}

/// Cluster-scoped snapshot parameters for a CSI driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotClass {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_class_kind")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}
