mod pvc;
mod snapshot_class;
mod snapshot_content;
mod volume_snapshot;

use std::sync::Arc;

use common::SnapshotStore;
use plugin_core::{ActionRegistry, PluginError};

pub use pvc::PvcRestoreAction;
pub use snapshot_class::VolumeSnapshotClassRestoreAction;
pub use snapshot_content::VolumeSnapshotContentRestoreAction;
pub use volume_snapshot::{
    BindingMetadata, DEFAULT_CONTENT_NAME_PREFIX, RestoreDecision, SecretRef,
    VolumeSnapshotRestoreAction, static_content_for,
};

use crate::config::BinderConfig;

pub const PVC_RESTORER: &str = "velero.io/csi-pvc-restorer";
pub const VOLUME_SNAPSHOT_RESTORER: &str = "velero.io/csi-volumesnapshot-restorer";
pub const VOLUME_SNAPSHOT_CLASS_RESTORER: &str = "velero.io/csi-volumesnapshotclass-restorer";
pub const VOLUME_SNAPSHOT_CONTENT_RESTORER: &str = "velero.io/csi-volumesnapshotcontent-restorer";

/// Registry with every CSI restore action, sharing `store`.
pub fn default_registry(
    store: Arc<dyn SnapshotStore>,
    binder: &BinderConfig,
) -> Result<ActionRegistry, PluginError> {
    let mut registry = ActionRegistry::new();
    registry.register(PVC_RESTORER, Arc::new(PvcRestoreAction))?;
    registry.register(
        VOLUME_SNAPSHOT_RESTORER,
        Arc::new(
            VolumeSnapshotRestoreAction::new(store)
                .with_content_name_prefix(binder.content_name_prefix.clone()),
        ),
    )?;
    registry.register(
        VOLUME_SNAPSHOT_CLASS_RESTORER,
        Arc::new(VolumeSnapshotClassRestoreAction),
    )?;
    registry.register(
        VOLUME_SNAPSHOT_CONTENT_RESTORER,
        Arc::new(VolumeSnapshotContentRestoreAction),
    )?;
    Ok(registry)
}
