use common::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    /// Backup-time metadata is incomplete; retrying will not help.
    #[error("{kind} {namespace}/{name} does not have a {key} annotation")]
    MissingAnnotation {
        kind: &'static str,
        namespace: String,
        name: String,
        key: &'static str,
    },

    #[error("invalid operation ID: {0:?}")]
    InvalidOperationId(String),

    #[error("failed to convert item: {0}")]
    InvalidItem(#[from] serde_json::Error),

    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },

    #[error("invocation cancelled")]
    Cancelled,

    #[error("invocation deadline exceeded")]
    DeadlineExceeded,

    #[error("no restore item action registered for {0}")]
    NotFound(String),

    #[error("restore item action already registered for {0}")]
    AlreadyRegistered(String),
}

impl PluginError {
    pub fn store(context: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            context: context.into(),
            source,
        }
    }

    /// Whether re-invoking the whole action may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Store { .. } | Self::Cancelled | Self::DeadlineExceeded
        )
    }
}
