//! In-process mailbox address for the processing subsystem.
//!
//! The gateway holds a [`Mailbox`] (the sending capability); whoever runs
//! the processing side owns the receiver and answers each [`Envelope`]
//! through its reply channel. A reply for a caller that already gave up
//! is dropped silently.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::command::Command;
use crate::dispatch::subsystem::{ProcessingSubsystem, SubsystemError, SubsystemResult};

/// A command delivered to the mailbox together with its reply slot.
#[derive(Debug)]
pub struct Envelope {
    command: Command,
    reply: oneshot::Sender<SubsystemResult>,
}

impl Envelope {
    /// Split into the command and a reply handle.
    pub fn into_parts(self) -> (Command, Reply) {
        (self.command, Reply(self.reply))
    }
}

/// Reply half of an [`Envelope`].
#[derive(Debug)]
pub struct Reply(oneshot::Sender<SubsystemResult>);

impl Reply {
    /// Send the result. Returns `false` if the caller is no longer waiting.
    pub fn send(self, result: SubsystemResult) -> bool {
        self.0.send(result).is_ok()
    }
}

/// Sending side of the processing subsystem's mailbox.
#[derive(Debug, Clone)]
pub struct Mailbox {
    tx: mpsc::Sender<Envelope>,
}

impl Mailbox {
    /// Create a bounded mailbox.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Create a mailbox served by `handler`, one task per command.
    pub fn spawn<F, Fut>(capacity: usize, handler: F) -> Self
    where
        F: Fn(Command) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SubsystemResult> + Send + 'static,
    {
        let (mailbox, mut rx) = Self::channel(capacity);
        let handler = Arc::new(handler);
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let handler = handler.clone();
                tokio::spawn(async move {
                    let (command, reply) = envelope.into_parts();
                    let operation = command.operation;
                    let correlation_id = command.correlation_id;
                    if !reply.send(handler(command).await) {
                        tracing::debug!(
                            operation = %operation,
                            correlation_id = %correlation_id,
                            "Caller gone, reply discarded"
                        );
                    }
                });
            }
        });
        mailbox
    }
}

#[async_trait]
impl ProcessingSubsystem for Mailbox {
    async fn send(&self, command: Command) -> SubsystemResult {
        let (reply, wait) = oneshot::channel();
        self.tx
            .send(Envelope { command, reply })
            .await
            .map_err(|_| SubsystemError::Unavailable("mailbox closed".to_string()))?;
        wait.await
            .map_err(|_| SubsystemError::Unavailable("reply dropped".to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Environment, Operation, Payload};
    use serde_json::json;

    fn command() -> Command {
        Command::new(Operation::GetBadgeClass, Environment::Dev, Payload::new())
    }

    #[tokio::test]
    async fn test_round_trip() {
        let mailbox = Mailbox::spawn(4, |command: Command| async move {
            Ok(json!({ "operation": command.operation.as_str() }))
        });
        let reply = mailbox.send(command()).await.unwrap();
        assert_eq!(reply, json!({ "operation": "getBadgeClass" }));
    }

    #[tokio::test]
    async fn test_closed_mailbox_is_unavailable() {
        let (mailbox, rx) = Mailbox::channel(1);
        drop(rx);
        let err = mailbox.send(command()).await.unwrap_err();
        assert_eq!(err, SubsystemError::Unavailable("mailbox closed".to_string()));
    }

    #[tokio::test]
    async fn test_dropped_reply_is_unavailable() {
        let (mailbox, mut rx) = Mailbox::channel(1);
        tokio::spawn(async move {
            // Receive and drop without answering.
            let _ = rx.recv().await;
        });
        let err = mailbox.send(command()).await.unwrap_err();
        assert_eq!(err, SubsystemError::Unavailable("reply dropped".to_string()));
    }
}
