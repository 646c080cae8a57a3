//! Well-known label and annotation keys, and label value sanitising.

use sha2::{Digest, Sha256};

/// Label recording which restore created an object.
pub const RESTORE_NAME_LABEL: &str = "velero.io/restore-name";

/// Storage-side snapshot handle recorded on a VolumeSnapshot at backup time.
pub const VOLUME_SNAPSHOT_HANDLE_ANNOTATION: &str = "velero.io/csi-volumesnapshot-handle";
/// CSI driver name recorded on a VolumeSnapshot at backup time.
pub const CSI_DRIVER_NAME_ANNOTATION: &str = "velero.io/csi-driver-name";
/// Deletion policy of the content a restored VolumeSnapshot is bound to.
pub const VSC_DELETION_POLICY_ANNOTATION: &str = "velero.io/csi-vsc-deletion-policy";
/// Snapshot deletion secret recorded on a VolumeSnapshot at backup time.
pub const DELETE_SNAPSHOT_SECRET_NAME_ANNOTATION: &str = "velero.io/csi-deletesnapshotsecret-name";
pub const DELETE_SNAPSHOT_SECRET_NAMESPACE_ANNOTATION: &str =
    "velero.io/csi-deletesnapshotsecret-namespace";

/// Name of the VolumeSnapshot a backed-up PVC should be repopulated from.
pub const VOLUME_SNAPSHOT_NAME_ANNOTATION: &str = "velero.io/volume-snapshot-name";

/// Secret the external snapshotter uses for a VolumeSnapshotClass.
pub const SNAPSHOTTER_SECRET_NAME_ANNOTATION: &str = "csi.storage.k8s.io/snapshotter-secret-name";
pub const SNAPSHOTTER_SECRET_NAMESPACE_ANNOTATION: &str =
    "csi.storage.k8s.io/snapshotter-secret-namespace";

/// Secret the external snapshotter uses when deleting a VolumeSnapshotContent.
pub const CONTENT_DELETION_SECRET_NAME_ANNOTATION: &str =
    "snapshot.storage.kubernetes.io/deletion-secret-name";
pub const CONTENT_DELETION_SECRET_NAMESPACE_ANNOTATION: &str =
    "snapshot.storage.kubernetes.io/deletion-secret-namespace";

/// Maximum length of a label value.
pub const DNS1035_LABEL_MAX_LENGTH: usize = 63;

const HASH_SUFFIX_LENGTH: usize = 6;

/// Shortens `label` to a valid label value.
///
/// Values within the limit are returned as-is. Longer values keep their first
/// 57 bytes and get the first 6 hex characters of their SHA-256 digest
/// appended, so distinct long names stay distinct.
pub fn valid_label_value(label: &str) -> String {
    if label.len() <= DNS1035_LABEL_MAX_LENGTH {
        return label.to_string();
    }

    let digest = hex::encode(Sha256::digest(label.as_bytes()));

    let mut cut = DNS1035_LABEL_MAX_LENGTH - HASH_SUFFIX_LENGTH;
    while !label.is_char_boundary(cut) {
        cut -= 1;
    }

    format!("{}{}", &label[..cut], &digest[..HASH_SUFFIX_LENGTH])
}
