mod error;
mod names;
mod traits;

pub mod filesystem;
pub mod memory;

pub use error::StoreError;
pub use filesystem::FilesystemSnapshotStore;
pub use memory::MemorySnapshotStore;
pub use names::generate_name;
pub use traits::SnapshotStore;
