use std::time::Duration;

use plugin_core::{ActionRegistry, ExecuteInput, ExecuteOutput, InvocationContext};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{info, warn};

use crate::config::RunnerConfig;
use crate::error::Result;

/// One restore item handed to the runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// Resource string used to pick the action, e.g. "volumesnapshots.snapshot.storage.k8s.io".
    pub resource: String,
    #[serde(flatten)]
    pub input: ExecuteInput,
}

impl InvocationRequest {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Read one request from `reader` until EOF.
    pub async fn read_from<R: AsyncRead + Unpin>(mut reader: R) -> Result<Self> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw).await?;
        Self::from_json(&raw)
    }
}

/// Context carrying the configured deadline, if any.
pub fn invocation_context(config: &RunnerConfig) -> InvocationContext {
    match config.timeout_secs {
        0 => InvocationContext::new(),
        secs => InvocationContext::with_timeout(Duration::from_secs(secs)),
    }
}

/// Dispatch `request` to the registered action.
pub async fn run_invocation(
    registry: &ActionRegistry,
    ctx: &InvocationContext,
    request: InvocationRequest,
) -> Result<ExecuteOutput> {
    let InvocationRequest { resource, input } = request;
    info!(resource = %resource, restore = %input.restore.metadata.name, "Running restore item action");

    match registry.execute(&resource, ctx, input).await {
        Ok(output) => Ok(output),
        Err(e) => {
            warn!(resource = %resource, retryable = e.is_retryable(), error = %e, "Restore item action failed");
            Err(e.into())
        }
    }
}
