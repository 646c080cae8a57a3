use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::label::{
    CONTENT_DELETION_SECRET_NAME_ANNOTATION, CONTENT_DELETION_SECRET_NAMESPACE_ANNOTATION,
    CSI_DRIVER_NAME_ANNOTATION, DELETE_SNAPSHOT_SECRET_NAME_ANNOTATION,
    DELETE_SNAPSHOT_SECRET_NAMESPACE_ANNOTATION, RESTORE_NAME_LABEL,
    VOLUME_SNAPSHOT_HANDLE_ANNOTATION, valid_label_value,
};
use common::snapshot::{VOLUME_SNAPSHOT_KIND, VOLUME_SNAPSHOTS_RESOURCE};
use common::{
    DeletionPolicy, ObjectMeta, ObjectReference, Restore, SnapshotStore, VolumeSnapshot,
    VolumeSnapshotContent, VolumeSnapshotContentSource, VolumeSnapshotContentSpec,
};
use plugin_core::{
    ExecuteInput, ExecuteOutput, InvocationContext, PluginError, ResourceSelector,
    RestoreItemAction,
};
use tracing::{debug, info, instrument};

pub const DEFAULT_CONTENT_NAME_PREFIX: &str = "velero-";

/// Secret the snapshotter needs to delete the storage-side snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    pub namespace: String,
    pub name: String,
}

/// Backup-time metadata needed to statically bind a restored snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingMetadata {
    pub snapshot_handle: String,
    pub driver: String,
    pub deletion_secret: Option<SecretRef>,
}

impl BindingMetadata {
    /// Read the handle and driver annotations from `vs`.
    ///
    /// Both are required; an absent or empty value is reported with the key
    /// and the snapshot it is missing from.
    pub fn from_snapshot(vs: &VolumeSnapshot) -> Result<Self, PluginError> {
        let snapshot_handle = required_annotation(vs, VOLUME_SNAPSHOT_HANDLE_ANNOTATION)?;
        let driver = required_annotation(vs, CSI_DRIVER_NAME_ANNOTATION)?;

        let deletion_secret = match (
            vs.metadata.annotation(DELETE_SNAPSHOT_SECRET_NAME_ANNOTATION),
            vs.metadata.annotation(DELETE_SNAPSHOT_SECRET_NAMESPACE_ANNOTATION),
        ) {
            (Some(name), Some(namespace)) if !name.is_empty() && !namespace.is_empty() => {
                Some(SecretRef {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                })
            }
            _ => None,
        };

        Ok(Self {
            snapshot_handle,
            driver,
            deletion_secret,
        })
    }
}

fn required_annotation(vs: &VolumeSnapshot, key: &'static str) -> Result<String, PluginError> {
    match vs.metadata.annotation(key) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(PluginError::MissingAnnotation {
            kind: VOLUME_SNAPSHOT_KIND,
            namespace: vs.metadata.namespace.clone(),
            name: vs.metadata.name.clone(),
            key,
        }),
    }
}

/// Builds the content that statically binds `vs` in `namespace` to its handle.
///
/// The name is left for the store to generate from `{prefix}{vs.name}-`.
pub fn static_content_for(
    vs: &VolumeSnapshot,
    namespace: &str,
    metadata: &BindingMetadata,
    restore: &Restore,
    prefix: &str,
) -> VolumeSnapshotContent {
    let mut labels = BTreeMap::new();
    labels.insert(
        RESTORE_NAME_LABEL.to_string(),
        valid_label_value(&restore.metadata.name),
    );

    let mut annotations = BTreeMap::new();
    if let Some(secret) = &metadata.deletion_secret {
        annotations.insert(
            CONTENT_DELETION_SECRET_NAME_ANNOTATION.to_string(),
            secret.name.clone(),
        );
        annotations.insert(
            CONTENT_DELETION_SECRET_NAMESPACE_ANNOTATION.to_string(),
            secret.namespace.clone(),
        );
    }

    VolumeSnapshotContent::new(
        ObjectMeta {
            generate_name: format!("{prefix}{}-", vs.metadata.name),
            labels,
            annotations,
            ..ObjectMeta::default()
        },
        VolumeSnapshotContentSpec {
            deletion_policy: DeletionPolicy::Retain,
            driver: metadata.driver.clone(),
            volume_snapshot_ref: ObjectReference {
                kind: VOLUME_SNAPSHOT_KIND.to_string(),
                namespace: namespace.to_string(),
                name: vs.metadata.name.clone(),
                ..ObjectReference::default()
            },
            source: VolumeSnapshotContentSource::from_snapshot_handle(
                metadata.snapshot_handle.clone(),
            ),
            ..VolumeSnapshotContentSpec::default()
        },
    )
}

/// Result of restoring one VolumeSnapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreDecision {
    /// The restore opted out of restoring volumes.
    SkippedByPolicy,
    /// The snapshot already exists in the destination namespace.
    AlreadyRestored(VolumeSnapshot),
    /// A new content was created and the snapshot rebound to it.
    Bound {
        snapshot: VolumeSnapshot,
        content: VolumeSnapshotContent,
    },
}

/// Rebinds restored VolumeSnapshots to their pre-existing storage handle.
///
/// Instead of letting the snapshot controller take a new snapshot of the
/// claim, a Retain content pointing at the backed-up handle is created and the
/// snapshot is rewritten to use it. A dynamically provisioned content cannot
/// be converted for static binding, so the backed-up one is never reused.
pub struct VolumeSnapshotRestoreAction {
    store: Arc<dyn SnapshotStore>,
    content_name_prefix: String,
}

impl VolumeSnapshotRestoreAction {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            store,
            content_name_prefix: DEFAULT_CONTENT_NAME_PREFIX.to_string(),
        }
    }

    pub fn with_content_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.content_name_prefix = prefix.into();
        self
    }

    /// Gate, idempotency check, then bind.
    ///
    /// The store is read before anything is created, and nothing about `vs`
    /// is returned unless every step succeeded. The gate is repeated here for
    /// callers that bypass `execute`, which gates before parsing the item.
    #[instrument(skip_all, fields(snapshot = %vs.metadata.qualified_name(), restore = %restore.metadata.name))]
    pub async fn restore_snapshot(
        &self,
        ctx: &InvocationContext,
        vs: VolumeSnapshot,
        restore: &Restore,
    ) -> Result<RestoreDecision, PluginError> {
        if !restore.restores_volumes() {
            info!("Restore did not request for PVs to be restored");
            return Ok(RestoreDecision::SkippedByPolicy);
        }

        let namespace = restore.target_namespace(&vs.metadata.namespace).to_string();

        if let Some(existing) = self.existing_snapshot(ctx, &namespace, &vs.metadata.name).await? {
            info!(namespace = %namespace, "VolumeSnapshot already exists, skipping static binding");
            return Ok(RestoreDecision::AlreadyRestored(existing));
        }

        let metadata = BindingMetadata::from_snapshot(&vs)?;
        let content = self
            .create_static_content(ctx, &vs, &namespace, &metadata, restore)
            .await?;
        let snapshot = vs.into_statically_bound(&namespace, &content.metadata.name);

        Ok(RestoreDecision::Bound { snapshot, content })
    }

    async fn existing_snapshot(
        &self,
        ctx: &InvocationContext,
        namespace: &str,
        name: &str,
    ) -> Result<Option<VolumeSnapshot>, PluginError> {
        ctx.run(self.store.get_volume_snapshot(namespace, name))
            .await?
            .map_err(|e| {
                PluginError::store(format!("failed to look up volumesnapshot {namespace}/{name}"), e)
            })
    }

    async fn create_static_content(
        &self,
        ctx: &InvocationContext,
        vs: &VolumeSnapshot,
        namespace: &str,
        metadata: &BindingMetadata,
        restore: &Restore,
    ) -> Result<VolumeSnapshotContent, PluginError> {
        let content = static_content_for(vs, namespace, metadata, restore, &self.content_name_prefix);
        debug!(
            namespace = %namespace,
            driver = %metadata.driver,
            "Creating VolumeSnapshotContent with Retain deletion policy"
        );

        let created = ctx
            .run(self.store.create_volume_snapshot_content(&content))
            .await?
            .map_err(|e| {
                PluginError::store(
                    format!(
                        "failed to create volumesnapshotcontents {}",
                        content.metadata.generate_name
                    ),
                    e,
                )
            })?;

        info!(
            content = %created.metadata.name,
            namespace = %namespace,
            "Created VolumeSnapshotContent with static binding"
        );
        Ok(created)
    }
}

#[async_trait]
impl RestoreItemAction for VolumeSnapshotRestoreAction {
    fn name(&self) -> &str {
        "VolumeSnapshotRestoreItemAction"
    }

    fn applies_to(&self) -> ResourceSelector {
        ResourceSelector::resources(&[VOLUME_SNAPSHOTS_RESOURCE])
    }

    async fn execute(
        &self,
        ctx: &InvocationContext,
        input: ExecuteInput,
    ) -> Result<ExecuteOutput, PluginError> {
        info!("Starting VolumeSnapshotRestoreItemAction");
        if !input.restore.restores_volumes() {
            info!(
                restore = %input.restore.metadata.qualified_name(),
                "Restore did not request for PVs to be restored"
            );
            return Ok(ExecuteOutput::skip());
        }

        let vs: VolumeSnapshot = input.item_as()?;
        let output = match self.restore_snapshot(ctx, vs, &input.restore).await? {
            // `execute` gates first, so this arm is not reached from here.
            RestoreDecision::SkippedByPolicy => ExecuteOutput::skip(),
            RestoreDecision::AlreadyRestored(existing) => ExecuteOutput::updated(&existing)?,
            RestoreDecision::Bound { snapshot, .. } => ExecuteOutput::updated(&snapshot)?,
        };

        info!("Returning from VolumeSnapshotRestoreItemAction with no additionalItems");
        Ok(output)
    }
}
