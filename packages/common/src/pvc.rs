use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::meta::{ObjectMeta, TypedLocalObjectReference};
use crate::snapshot::{SNAPSHOT_API_GROUP, VOLUME_SNAPSHOT_KIND};

pub const PERSISTENT_VOLUME_CLAIMS_RESOURCE: &str = "persistentvolumeclaims";

/// Annotations tying a claim to the volume it was bound to in the source cluster.
pub const BINDING_ANNOTATIONS: [&str; 5] = [
    "pv.kubernetes.io/bind-completed",
    "pv.kubernetes.io/bound-by-controller",
    "volume.kubernetes.io/storage-provisioner",
    "volume.beta.kubernetes.io/storage-provisioner",
    "volume.kubernetes.io/selected-node",
];

fn default_api_version() -> String {
    "v1".into()
}
fn default_kind() -> String {
    "PersistentVolumeClaim".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaim {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PersistentVolumeClaimSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaimSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<TypedLocalObjectReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_ref: Option<TypedLocalObjectReference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PersistentVolumeClaim {
    /// Drops the annotations that pin this claim to its old volume and node.
    pub fn without_binding_annotations(mut self) -> Self {
        for key in BINDING_ANNOTATIONS {
            self.metadata.annotations.remove(key);
        }
        self
    }

    /// Repopulates this claim from the named VolumeSnapshot instead of
    /// rebinding it to its original volume.
    pub fn restored_from_snapshot(mut self, snapshot_name: &str) -> Self {
        let source = TypedLocalObjectReference {
            api_group: Some(SNAPSHOT_API_GROUP.to_string()),
            kind: VOLUME_SNAPSHOT_KIND.to_string(),
            name: snapshot_name.to_string(),
        };
        self.spec.volume_name = None;
        self.spec.data_source = Some(source.clone());
        self.spec.data_source_ref = Some(source);
        self
    }
}
