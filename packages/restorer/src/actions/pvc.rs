use async_trait::async_trait;
use common::PersistentVolumeClaim;
use common::label::VOLUME_SNAPSHOT_NAME_ANNOTATION;
use common::pvc::PERSISTENT_VOLUME_CLAIMS_RESOURCE;
use common::snapshot::VOLUME_SNAPSHOTS_RESOURCE;
use plugin_core::{
    ExecuteInput, ExecuteOutput, InvocationContext, PluginError, ResourceIdentifier,
    ResourceSelector, RestoreItemAction,
};
use tracing::info;

/// Points restored claims at the VolumeSnapshot they were backed up to.
pub struct PvcRestoreAction;

#[async_trait]
impl RestoreItemAction for PvcRestoreAction {
    fn name(&self) -> &str {
        "PVCRestoreItemAction"
    }

    fn applies_to(&self) -> ResourceSelector {
        ResourceSelector::resources(&[PERSISTENT_VOLUME_CLAIMS_RESOURCE])
    }

    async fn execute(
        &self,
        _ctx: &InvocationContext,
        input: ExecuteInput,
    ) -> Result<ExecuteOutput, PluginError> {
        if !input.restore.restores_volumes() {
            info!(
                restore = %input.restore.metadata.qualified_name(),
                "Restore did not request for PVs to be restored"
            );
            return Ok(ExecuteOutput::skip());
        }

        let pvc: PersistentVolumeClaim = input.item_as()?;
        let pvc = pvc.without_binding_annotations();

        let Some(snapshot_name) = pvc
            .metadata
            .annotation(VOLUME_SNAPSHOT_NAME_ANNOTATION)
            .map(str::to_string)
        else {
            info!(
                pvc = %pvc.metadata.qualified_name(),
                "PVC has no VolumeSnapshot annotation, restoring as-is"
            );
            return ExecuteOutput::updated(&pvc);
        };

        let namespace = pvc.metadata.namespace.clone();
        let pvc = pvc.restored_from_snapshot(&snapshot_name);
        info!(
            pvc = %pvc.metadata.qualified_name(),
            snapshot = %snapshot_name,
            "Reset PVC data source to VolumeSnapshot"
        );

        Ok(ExecuteOutput::updated(&pvc)?.with_additional_items(vec![ResourceIdentifier {
            group_resource: VOLUME_SNAPSHOTS_RESOURCE.to_string(),
            namespace,
            name: snapshot_name,
        }]))
    }
}
