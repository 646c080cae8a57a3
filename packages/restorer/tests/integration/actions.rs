use common::label::{
    SNAPSHOTTER_SECRET_NAME_ANNOTATION, SNAPSHOTTER_SECRET_NAMESPACE_ANNOTATION,
    VOLUME_SNAPSHOT_NAME_ANNOTATION,
};
use common::pvc::PERSISTENT_VOLUME_CLAIMS_RESOURCE;
use common::snapshot::{
    SECRETS_RESOURCE, VOLUME_SNAPSHOT_CLASSES_RESOURCE, VOLUME_SNAPSHOT_CONTENTS_RESOURCE,
    VOLUME_SNAPSHOTS_RESOURCE,
};
use common::{PersistentVolumeClaim, Restore, VolumeSnapshot};
use plugin_core::{
    ExecuteInput, InvocationContext, PluginError, ResourceIdentifier, RestoreItemAction,
};
use restorer::actions::{
    PvcRestoreAction, VOLUME_SNAPSHOT_RESTORER, VolumeSnapshotClassRestoreAction,
    VolumeSnapshotContentRestoreAction,
};
use restorer::config::BinderConfig;
use restorer::{InvocationRequest, default_registry, run_invocation};
use serde_json::{Value, json};

use crate::support::{RecordingStore, backed_up_snapshot, input_for};

fn claim(annotations: Value) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "PersistentVolumeClaim",
        "metadata": {
            "name": "data",
            "namespace": "ns-a",
            "annotations": annotations,
        },
        "spec": {
            "accessModes": ["ReadWriteOnce"],
            "volumeName": "pvc-1234",
            "storageClassName": "gp3",
        },
    })
}

#[tokio::test]
async fn pvc_is_pointed_at_its_snapshot() {
    let item = claim(json!({
        VOLUME_SNAPSHOT_NAME_ANNOTATION: "snap1",
        "pv.kubernetes.io/bind-completed": "yes",
        "volume.kubernetes.io/selected-node": "node-1",
    }));

    let output = PvcRestoreAction
        .execute(
            &InvocationContext::new(),
            ExecuteInput::new(item, Restore::new("velero", "r1")),
        )
        .await
        .unwrap();

    let pvc: PersistentVolumeClaim =
        serde_json::from_value(output.updated_item.clone().unwrap()).unwrap();
    assert!(pvc.spec.volume_name.is_none());
    let source = pvc.spec.data_source.unwrap();
    assert_eq!(source.kind, "VolumeSnapshot");
    assert_eq!(source.name, "snap1");
    assert!(pvc.metadata.annotation("pv.kubernetes.io/bind-completed").is_none());
    assert!(pvc.metadata.annotation("volume.kubernetes.io/selected-node").is_none());
    assert_eq!(pvc.spec.extra["storageClassName"], "gp3");

    assert_eq!(
        output.additional_items,
        vec![ResourceIdentifier {
            group_resource: VOLUME_SNAPSHOTS_RESOURCE.into(),
            namespace: "ns-a".into(),
            name: "snap1".into(),
        }]
    );
}

#[tokio::test]
async fn pvc_without_snapshot_keeps_its_volume() {
    let output = PvcRestoreAction
        .execute(
            &InvocationContext::new(),
            ExecuteInput::new(claim(json!({})), Restore::new("velero", "r1")),
        )
        .await
        .unwrap();

    let pvc: PersistentVolumeClaim =
        serde_json::from_value(output.updated_item.unwrap()).unwrap();
    assert_eq!(pvc.spec.volume_name.as_deref(), Some("pvc-1234"));
    assert!(pvc.spec.data_source.is_none());
    assert!(output.additional_items.is_empty());
}

#[tokio::test]
async fn pvc_is_skipped_when_volumes_are_not_restored() {
    let output = PvcRestoreAction
        .execute(
            &InvocationContext::new(),
            ExecuteInput::new(
                claim(json!({VOLUME_SNAPSHOT_NAME_ANNOTATION: "snap1"})),
                Restore::new("velero", "r1").with_restore_pvs(false),
            ),
        )
        .await
        .unwrap();
    assert!(output.skip_restore);
}

#[tokio::test]
async fn class_brings_its_snapshotter_secret() {
    let class = json!({
        "apiVersion": "snapshot.storage.k8s.io/v1",
        "kind": "VolumeSnapshotClass",
        "metadata": {
            "name": "csi-snapclass",
            "annotations": {
                SNAPSHOTTER_SECRET_NAME_ANNOTATION: "snap-creds",
                SNAPSHOTTER_SECRET_NAMESPACE_ANNOTATION: "kube-system",
            },
        },
        "driver": "ebs.csi.aws.com",
        "deletionPolicy": "Delete",
    });

    let output = VolumeSnapshotClassRestoreAction
        .execute(
            &InvocationContext::new(),
            ExecuteInput::new(class.clone(), Restore::new("velero", "r1")),
        )
        .await
        .unwrap();

    assert_eq!(output.updated_item.unwrap()["driver"], "ebs.csi.aws.com");
    assert_eq!(
        output.additional_items,
        vec![ResourceIdentifier {
            group_resource: SECRETS_RESOURCE.into(),
            namespace: "kube-system".into(),
            name: "snap-creds".into(),
        }]
    );
}

#[tokio::test]
async fn class_without_secret_has_no_additional_items() {
    let class = json!({
        "metadata": {
            "name": "csi-snapclass",
            "annotations": {SNAPSHOTTER_SECRET_NAME_ANNOTATION: "snap-creds"},
        },
        "driver": "ebs.csi.aws.com",
        "deletionPolicy": "Retain",
    });

    let output = VolumeSnapshotClassRestoreAction
        .execute(
            &InvocationContext::new(),
            ExecuteInput::new(class, Restore::new("velero", "r1")),
        )
        .await
        .unwrap();
    assert!(output.additional_items.is_empty());
}

#[tokio::test]
async fn backed_up_content_is_never_restored() {
    let output = VolumeSnapshotContentRestoreAction
        .execute(
            &InvocationContext::new(),
            ExecuteInput::new(
                json!({"metadata": {"name": "snapcontent-1"}}),
                Restore::new("velero", "r1"),
            ),
        )
        .await
        .unwrap();
    assert!(output.skip_restore);
}

#[tokio::test]
async fn default_registry_dispatches_every_resource() {
    let store = RecordingStore::new();
    let registry = default_registry(store.clone(), &BinderConfig::default()).unwrap();

    assert_eq!(registry.len(), 4);
    for resource in [
        PERSISTENT_VOLUME_CLAIMS_RESOURCE,
        VOLUME_SNAPSHOTS_RESOURCE,
        VOLUME_SNAPSHOT_CLASSES_RESOURCE,
        VOLUME_SNAPSHOT_CONTENTS_RESOURCE,
    ] {
        assert!(registry.for_resource(resource).is_some(), "{resource}");
    }
    assert_eq!(
        registry.get(VOLUME_SNAPSHOT_RESTORER).unwrap().name(),
        "VolumeSnapshotRestoreItemAction"
    );
}

#[tokio::test]
async fn runner_executes_json_invocation() {
    let store = RecordingStore::new();
    let binder = BinderConfig {
        content_name_prefix: "restored-".into(),
    };
    let registry = default_registry(store.clone(), &binder).unwrap();

    let input = input_for(
        &backed_up_snapshot("ns-a", "snap1", "h-123"),
        Restore::new("velero", "r1").with_namespace_mapping("ns-a", "ns-b"),
    );
    let mut raw = serde_json::to_value(&input).unwrap();
    raw["resource"] = json!(VOLUME_SNAPSHOTS_RESOURCE);
    let request = InvocationRequest::from_json(raw.to_string().as_bytes()).unwrap();

    let output = run_invocation(&registry, &InvocationContext::new(), request)
        .await
        .unwrap();
    let vs: VolumeSnapshot = serde_json::from_value(output.updated_item.unwrap()).unwrap();
    assert_eq!(vs.metadata.namespace, "ns-b");
    assert!(vs.spec.source.content_name().unwrap().starts_with("restored-snap1-"));
    assert_eq!(store.creates(), 1);
}

#[tokio::test]
async fn runner_reports_unknown_resources() {
    let registry = default_registry(RecordingStore::new(), &BinderConfig::default()).unwrap();
    let request = InvocationRequest {
        resource: "pods".into(),
        input: ExecuteInput::new(json!({}), Restore::new("velero", "r1")),
    };

    let err = run_invocation(&registry, &InvocationContext::new(), request)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        restorer::RestorerError::Plugin(PluginError::NotFound(_))
    ));
}
