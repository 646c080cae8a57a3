use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::meta::ObjectMeta;

fn default_api_version() -> String {
    "velero.io/v1".into()
}
fn default_kind() -> String {
    "Restore".into()
}

/// The restore an action is invoked on behalf of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restore {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: RestoreSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub backup_name: String,

    /// Whether volumes are restored. Unset means yes.
    #[serde(default, rename = "restorePVs", skip_serializing_if = "Option::is_none")]
    pub restore_pvs: Option<bool>,

    /// Source namespace to destination namespace.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub namespace_mapping: BTreeMap<String, String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Restore {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ObjectMeta::named(namespace, name),
            spec: RestoreSpec::default(),
            status: None,
        }
    }

    pub fn with_restore_pvs(mut self, restore_pvs: bool) -> Self {
        self.spec.restore_pvs = Some(restore_pvs);
        self
    }

    pub fn with_namespace_mapping(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.spec.namespace_mapping.insert(from.into(), to.into());
        self
    }

    /// False only when the restore explicitly opted out of restoring volumes.
    pub fn restores_volumes(&self) -> bool {
        self.spec.restore_pvs != Some(false)
    }

    /// Namespace an object from `original` lands in for this restore.
    pub fn target_namespace<'a>(&'a self, original: &'a str) -> &'a str {
        self.spec
            .namespace_mapping
            .get(original)
            .map(String::as_str)
            .unwrap_or(original)
    }
}
