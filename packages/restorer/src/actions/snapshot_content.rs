use async_trait::async_trait;
use common::snapshot::VOLUME_SNAPSHOT_CONTENTS_RESOURCE;
use plugin_core::{
    ExecuteInput, ExecuteOutput, InvocationContext, PluginError, ResourceSelector,
    RestoreItemAction,
};
use tracing::info;

/// Drops backed-up contents; the snapshot action creates fresh ones.
pub struct VolumeSnapshotContentRestoreAction;

#[async_trait]
impl RestoreItemAction for VolumeSnapshotContentRestoreAction {
    fn name(&self) -> &str {
        "VolumeSnapshotContentRestoreItemAction"
    }

    fn applies_to(&self) -> ResourceSelector {
        ResourceSelector::resources(&[VOLUME_SNAPSHOT_CONTENTS_RESOURCE])
    }

    async fn execute(
        &self,
        _ctx: &InvocationContext,
        input: ExecuteInput,
    ) -> Result<ExecuteOutput, PluginError> {
        let name = input
            .item
            .pointer("/metadata/name")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        info!(content = %name, "Skipping VolumeSnapshotContent restore");
        Ok(ExecuteOutput::skip())
    }
}
