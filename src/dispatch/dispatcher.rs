//! Bounded-wait command dispatch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;
use tokio::time::timeout;
use tracing::Span;
use uuid::Uuid;

use crate::command::Command;
use crate::dispatch::subsystem::{ProcessingSubsystem, SubsystemError};
use crate::observability::metrics;

/// Dispatch failures. A timeout is never folded into a subsystem error.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no reply from processing subsystem within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Subsystem(#[from] SubsystemError),
}

impl DispatchError {
    /// Metrics label for this failure.
    pub fn outcome(&self) -> &'static str {
        match self {
            DispatchError::Timeout(_) => "timeout",
            DispatchError::Subsystem(SubsystemError::Rejected { .. }) => "rejected",
            DispatchError::Subsystem(SubsystemError::Unavailable(_)) => "unavailable",
        }
    }
}

/// Sends commands to the processing subsystem and waits a bounded time.
///
/// Holds no per-request state; one `dispatch` call is exactly one send.
#[derive(Clone)]
pub struct Dispatcher {
    subsystem: Arc<dyn ProcessingSubsystem>,
    wait: Duration,
    span: Span,
}

impl Dispatcher {
    pub fn new(subsystem: Arc<dyn ProcessingSubsystem>, wait: Duration, span: Span) -> Self {
        Self {
            subsystem,
            wait,
            span,
        }
    }

    pub async fn dispatch(
        &self,
        mut command: Command,
        request_id: &str,
    ) -> Result<Value, DispatchError> {
        command.correlation_id = Uuid::new_v4();
        command.request_id = Some(request_id.to_string());

        let operation = command.operation;
        let correlation_id = command.correlation_id;
        let start = Instant::now();

        tracing::debug!(
            parent: &self.span,
            operation = %operation,
            correlation_id = %correlation_id,
            request_id = %request_id,
            "Dispatching command"
        );

        let outcome = match timeout(self.wait, self.subsystem.send(command)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(DispatchError::Subsystem(e)),
            Err(_) => Err(DispatchError::Timeout(self.wait)),
        };

        match &outcome {
            Ok(_) => {
                metrics::record_dispatch(operation.as_str(), "ok", start);
                tracing::debug!(
                    parent: &self.span,
                    operation = %operation,
                    correlation_id = %correlation_id,
                    request_id = %request_id,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Command answered"
                );
            }
            Err(e) => {
                metrics::record_dispatch(operation.as_str(), e.outcome(), start);
                tracing::warn!(
                    parent: &self.span,
                    operation = %operation,
                    correlation_id = %correlation_id,
                    request_id = %request_id,
                    error = %e,
                    "Command failed"
                );
            }
        }

        outcome
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("wait", &self.wait)
            .finish()
    }
}
