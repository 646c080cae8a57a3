pub mod action;
pub mod context;
pub mod error;
pub mod registry;

pub use action::{
    ExecuteInput, ExecuteOutput, OperationProgress, ResourceIdentifier, ResourceSelector,
    RestoreItemAction,
};
pub use context::InvocationContext;
pub use error::PluginError;
pub use registry::{ActionInfo, ActionRegistry};
