pub mod config;
pub mod label;
pub mod meta;
pub mod pvc;
pub mod restore;
pub mod snapshot;
pub mod store;

pub use meta::{ObjectMeta, ObjectReference, TypedLocalObjectReference};
pub use pvc::PersistentVolumeClaim;
pub use restore::{Restore, RestoreSpec};
pub use snapshot::{
    DeletionPolicy, VolumeSnapshot, VolumeSnapshotClass, VolumeSnapshotContent,
    VolumeSnapshotContentSource, VolumeSnapshotContentSpec, VolumeSnapshotSource,
    VolumeSnapshotSpec,
};
pub use store::{SnapshotStore, StoreError};
