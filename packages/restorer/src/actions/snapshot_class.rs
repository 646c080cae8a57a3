use async_trait::async_trait;
use common::VolumeSnapshotClass;
use common::label::{SNAPSHOTTER_SECRET_NAME_ANNOTATION, SNAPSHOTTER_SECRET_NAMESPACE_ANNOTATION};
use common::snapshot::{SECRETS_RESOURCE, VOLUME_SNAPSHOT_CLASSES_RESOURCE};
use plugin_core::{
    ExecuteInput, ExecuteOutput, InvocationContext, PluginError, ResourceIdentifier,
    ResourceSelector, RestoreItemAction,
};
use tracing::info;

/// Restores snapshot classes together with their snapshotter secret.
pub struct VolumeSnapshotClassRestoreAction;

#[async_trait]
impl RestoreItemAction for VolumeSnapshotClassRestoreAction {
    fn name(&self) -> &str {
        "VolumeSnapshotClassRestoreItemAction"
    }

    fn applies_to(&self) -> ResourceSelector {
        ResourceSelector::resources(&[VOLUME_SNAPSHOT_CLASSES_RESOURCE])
    }

    async fn execute(
        &self,
        _ctx: &InvocationContext,
        input: ExecuteInput,
    ) -> Result<ExecuteOutput, PluginError> {
        let class: VolumeSnapshotClass = input.item_as()?;

        let mut additional_items = Vec::new();
        if let (Some(name), Some(namespace)) = (
            class.metadata.annotation(SNAPSHOTTER_SECRET_NAME_ANNOTATION),
            class.metadata.annotation(SNAPSHOTTER_SECRET_NAMESPACE_ANNOTATION),
        ) {
            info!(
                class = %class.metadata.name,
                secret = %format!("{namespace}/{name}"),
                "Adding snapshotter secret as additional item"
            );
            additional_items.push(ResourceIdentifier {
                group_resource: SECRETS_RESOURCE.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }

        Ok(ExecuteOutput::updated(&class)?.with_additional_items(additional_items))
    }
}
