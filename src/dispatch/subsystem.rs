//! Contract of the external processing subsystem.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::command::Command;

/// Failures reported by (or while reaching) the processing subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubsystemError {
    /// The subsystem understood the command and refused it.
    #[error("command rejected ({status}) {code}: {message}")]
    Rejected {
        code: String,
        message: String,
        status: u16,
    },

    /// The subsystem could not be reached or gave no usable reply.
    #[error("processing subsystem unavailable: {0}")]
    Unavailable(String),
}

impl SubsystemError {
    pub fn rejected(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self::Rejected {
            code: code.into(),
            message: message.into(),
            status,
        }
    }
}

/// Result of one command round trip.
pub type SubsystemResult = Result<Value, SubsystemError>;

/// Single logical entry point of the processing subsystem.
///
/// Implementations must not retry: one call is one delivery attempt.
#[async_trait]
pub trait ProcessingSubsystem: Send + Sync {
    async fn send(&self, command: Command) -> SubsystemResult;
}
