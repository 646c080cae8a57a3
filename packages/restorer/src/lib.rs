pub mod actions;
pub mod config;
pub mod error;
pub mod runner;

pub use actions::default_registry;
pub use config::RestorerAppConfig;
pub use error::{RestorerError, Result};
pub use runner::{InvocationRequest, invocation_context, run_invocation};
