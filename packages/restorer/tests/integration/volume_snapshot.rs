use std::sync::Arc;
use std::time::Duration;

use common::label::{
    CSI_DRIVER_NAME_ANNOTATION, RESTORE_NAME_LABEL, VOLUME_SNAPSHOT_HANDLE_ANNOTATION,
    VSC_DELETION_POLICY_ANNOTATION,
};
use common::store::FilesystemSnapshotStore;
use common::{DeletionPolicy, Restore, SnapshotStore, VolumeSnapshot};
use plugin_core::{ExecuteInput, InvocationContext, PluginError, RestoreItemAction};
use restorer::actions::{RestoreDecision, VolumeSnapshotRestoreAction};
use serde_json::json;

use crate::support::{RecordingStore, backed_up_snapshot, input_for};

fn bound_snapshot(output: &plugin_core::ExecuteOutput) -> VolumeSnapshot {
    serde_json::from_value(output.updated_item.clone().expect("updated item")).unwrap()
}

#[tokio::test]
async fn binds_snapshot_to_retained_static_content() {
    let store = RecordingStore::new();
    let action = VolumeSnapshotRestoreAction::new(store.clone());
    let vs = backed_up_snapshot("ns-a", "snap1", "h-123");

    let output = action
        .execute(&InvocationContext::new(), input_for(&vs, Restore::new("velero", "r1")))
        .await
        .unwrap();

    assert!(!output.skip_restore);
    assert!(output.additional_items.is_empty());

    let restored = bound_snapshot(&output);
    let content_name = restored.spec.source.content_name().unwrap().to_string();
    assert!(content_name.starts_with("velero-snap1-"));
    assert!(restored.spec.source.persistent_volume_claim_name.is_none());
    assert_eq!(restored.metadata.namespace, "ns-a");
    assert_eq!(
        restored.metadata.annotation(VSC_DELETION_POLICY_ANNOTATION),
        Some("Retain")
    );

    let content = store
        .get_volume_snapshot_content(&content_name)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(content.spec.deletion_policy, DeletionPolicy::Retain);
    assert_eq!(content.spec.driver, "ebs.csi.aws.com");
    assert_eq!(content.static_snapshot_handle(), Some("h-123"));
    assert_eq!(content.spec.volume_snapshot_ref.namespace, "ns-a");
    assert_eq!(content.spec.volume_snapshot_ref.name, "snap1");
    assert_eq!(content.metadata.label(RESTORE_NAME_LABEL), Some("r1"));
    assert_eq!(store.creates(), 1);
}

#[tokio::test]
async fn restore_pvs_false_skips_without_touching_store() {
    let store = RecordingStore::new();
    let action = VolumeSnapshotRestoreAction::new(store.clone());
    let restore = Restore::new("velero", "r1").with_restore_pvs(false);

    let output = action
        .execute(
            &InvocationContext::new(),
            input_for(&backed_up_snapshot("ns-a", "snap1", "h-123"), restore.clone()),
        )
        .await
        .unwrap();
    assert!(output.skip_restore);
    assert!(output.updated_item.is_none());

    // The gate runs before the item is even parsed.
    let malformed = ExecuteInput::new(json!({"metadata": 42}), restore);
    let output = action
        .execute(&InvocationContext::new(), malformed)
        .await
        .unwrap();
    assert!(output.skip_restore);

    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn restore_pvs_true_behaves_like_unset() {
    let store = RecordingStore::new();
    let action = VolumeSnapshotRestoreAction::new(store.clone());
    let restore = Restore::new("velero", "r1").with_restore_pvs(true);

    let output = action
        .execute(
            &InvocationContext::new(),
            input_for(&backed_up_snapshot("ns-a", "snap1", "h-123"), restore),
        )
        .await
        .unwrap();
    assert!(!output.skip_restore);
    assert_eq!(store.creates(), 1);
}

#[tokio::test]
async fn mapped_namespace_is_used_for_lookup_and_binding() {
    let store = RecordingStore::new();
    let action = VolumeSnapshotRestoreAction::new(store.clone());
    let restore = Restore::new("velero", "r1").with_namespace_mapping("ns-a", "ns-b");

    let decision = action
        .restore_snapshot(
            &InvocationContext::new(),
            backed_up_snapshot("ns-a", "snap1", "h-123"),
            &restore,
        )
        .await
        .unwrap();
    let RestoreDecision::Bound { snapshot, content } = decision else {
        panic!("expected Bound");
    };
    assert_eq!(snapshot.metadata.namespace, "ns-b");
    assert_eq!(content.spec.volume_snapshot_ref.namespace, "ns-b");

    // Unmapped namespaces are kept.
    let decision = action
        .restore_snapshot(
            &InvocationContext::new(),
            backed_up_snapshot("ns-c", "snap1", "h-456"),
            &restore,
        )
        .await
        .unwrap();
    let RestoreDecision::Bound { content, .. } = decision else {
        panic!("expected Bound");
    };
    assert_eq!(content.spec.volume_snapshot_ref.namespace, "ns-c");
}

#[tokio::test]
async fn existing_snapshot_in_mapped_namespace_is_not_rebound() {
    let store = RecordingStore::new();
    let action = VolumeSnapshotRestoreAction::new(store.clone());
    let restore = Restore::new("velero", "r1").with_namespace_mapping("ns-a", "ns-b");

    let existing = store
        .create_volume_snapshot(&backed_up_snapshot("ns-b", "snap1", "h-old"))
        .await
        .unwrap();

    let output = action
        .execute(
            &InvocationContext::new(),
            input_for(&backed_up_snapshot("ns-a", "snap1", "h-123"), restore),
        )
        .await
        .unwrap();

    assert!(!output.skip_restore);
    assert_eq!(bound_snapshot(&output), existing);
    assert_eq!(store.creates(), 0);
    assert_eq!(store.content_count().await, 0);
}

#[tokio::test]
async fn retry_after_success_creates_no_second_content() {
    let store = RecordingStore::new();
    let action = VolumeSnapshotRestoreAction::new(store.clone());
    let restore = Restore::new("velero", "r1");
    let vs = backed_up_snapshot("ns-a", "snap1", "h-123");

    let first = action
        .execute(&InvocationContext::new(), input_for(&vs, restore.clone()))
        .await
        .unwrap();

    // The orchestrator persists what the action returned.
    let persisted = store
        .create_volume_snapshot(&bound_snapshot(&first))
        .await
        .unwrap();

    let second = action
        .execute(&InvocationContext::new(), input_for(&vs, restore))
        .await
        .unwrap();

    assert_eq!(bound_snapshot(&second), persisted);
    assert_eq!(store.creates(), 1);
    assert_eq!(store.content_count().await, 1);
}

#[tokio::test]
async fn missing_annotations_fail_without_creating() {
    let store = RecordingStore::new();
    let action = VolumeSnapshotRestoreAction::new(store.clone());

    for missing in [VOLUME_SNAPSHOT_HANDLE_ANNOTATION, CSI_DRIVER_NAME_ANNOTATION] {
        let mut vs = backed_up_snapshot("ns-a", "snap1", "h-123");
        vs.metadata.annotations.remove(missing);

        let err = action
            .execute(&InvocationContext::new(), input_for(&vs, Restore::new("velero", "r1")))
            .await
            .unwrap_err();

        assert!(matches!(&err, PluginError::MissingAnnotation { key, .. } if *key == missing));
        let message = err.to_string();
        assert!(message.contains("ns-a/snap1"), "{message}");
        assert!(message.contains(missing), "{message}");
    }

    assert_eq!(store.creates(), 0);
}

#[tokio::test]
async fn lookup_error_aborts_before_create() {
    let store = RecordingStore::new();
    store.fail_gets();
    let action = VolumeSnapshotRestoreAction::new(store.clone());

    let err = action
        .execute(
            &InvocationContext::new(),
            input_for(
                &backed_up_snapshot("ns-a", "snap1", "h-123"),
                Restore::new("velero", "r1"),
            ),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PluginError::Store { .. }));
    assert!(err.is_retryable());
    assert!(err.to_string().contains("ns-a/snap1"));
    assert_eq!(store.gets(), 1);
    assert_eq!(store.creates(), 0);
}

#[tokio::test]
async fn create_error_is_returned_with_context() {
    let store = RecordingStore::new();
    store.fail_creates();
    let action = VolumeSnapshotRestoreAction::new(store.clone());

    let err = action
        .execute(
            &InvocationContext::new(),
            input_for(
                &backed_up_snapshot("ns-a", "snap1", "h-123"),
                Restore::new("velero", "r1"),
            ),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PluginError::Store { .. }));
    assert!(err.to_string().contains("velero-snap1-"));
    assert_eq!(store.content_count().await, 0);
}

#[tokio::test]
async fn cancelled_invocation_makes_no_store_calls() {
    let store = RecordingStore::new();
    let action = VolumeSnapshotRestoreAction::new(store.clone());
    let ctx = InvocationContext::new();
    ctx.cancel();

    let err = action
        .execute(
            &ctx,
            input_for(
                &backed_up_snapshot("ns-a", "snap1", "h-123"),
                Restore::new("velero", "r1"),
            ),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PluginError::Cancelled));
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn deadline_stops_stalled_lookup() {
    let store = RecordingStore::new();
    store.stall_gets();
    let action = VolumeSnapshotRestoreAction::new(store.clone());
    let ctx = InvocationContext::with_timeout(Duration::from_millis(20));

    let err = action
        .execute(
            &ctx,
            input_for(
                &backed_up_snapshot("ns-a", "snap1", "h-123"),
                Restore::new("velero", "r1"),
            ),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PluginError::DeadlineExceeded));
    assert_eq!(store.creates(), 0);
}

#[tokio::test]
async fn concurrent_restores_of_distinct_snapshots() {
    let store = RecordingStore::new();
    let action = Arc::new(VolumeSnapshotRestoreAction::new(store.clone()));
    let restore = Restore::new("velero", "r1");

    let runs = (0..8).map(|i| {
        let action = Arc::clone(&action);
        let restore = restore.clone();
        async move {
            let vs = backed_up_snapshot("ns-a", &format!("snap{i}"), &format!("h-{i}"));
            action
                .execute(&InvocationContext::new(), input_for(&vs, restore))
                .await
        }
    });
    let outputs = futures::future::join_all(runs).await;

    let mut content_names: Vec<String> = outputs
        .into_iter()
        .map(|o| {
            bound_snapshot(&o.unwrap())
                .spec
                .source
                .content_name()
                .unwrap()
                .to_string()
        })
        .collect();
    content_names.sort();
    content_names.dedup();
    assert_eq!(content_names.len(), 8);
    assert_eq!(store.content_count().await, 8);
}

#[tokio::test]
async fn filesystem_store_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn SnapshotStore> = Arc::new(
        FilesystemSnapshotStore::new(dir.path().join("store"))
            .await
            .unwrap(),
    );
    let action = VolumeSnapshotRestoreAction::new(Arc::clone(&store));
    let vs = backed_up_snapshot("ns-a", "snap1", "h-123");
    let restore = Restore::new("velero", "r1");

    let output = action
        .execute(&InvocationContext::new(), input_for(&vs, restore.clone()))
        .await
        .unwrap();
    let restored = bound_snapshot(&output);
    store.create_volume_snapshot(&restored).await.unwrap();

    let contents = store.list_volume_snapshot_contents().await.unwrap();
    assert_eq!(contents.len(), 1);
    assert_eq!(
        restored.spec.source.content_name(),
        Some(contents[0].metadata.name.as_str())
    );

    let again = action
        .execute(&InvocationContext::new(), input_for(&vs, restore))
        .await
        .unwrap();
    assert_eq!(
        bound_snapshot(&again).spec.source.content_name(),
        restored.spec.source.content_name()
    );
    assert_eq!(store.list_volume_snapshot_contents().await.unwrap().len(), 1);
}
