use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::PluginError;

/// Caller-owned cancellation and deadline for one action invocation.
///
/// Every store call an action makes goes through [`InvocationContext::run`],
/// so the caller's deadline or cancellation reaches each remote call.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl InvocationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drive `fut` unless the invocation is cancelled or its deadline passes first.
    ///
    /// An already-cancelled context never polls `fut`.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, PluginError>
    where
        F: Future<Output = T>,
    {
        if self.cancel.is_cancelled() {
            return Err(PluginError::Cancelled);
        }

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PluginError::Cancelled),
            _ = deadline => Err(PluginError::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }
}
