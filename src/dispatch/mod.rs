//! Command dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! validated Command
//!     → dispatcher.rs (correlation id, request id, bounded wait)
//!     → ProcessingSubsystem (mailbox.rs in-process, http_client.rs remote)
//!     → reply value | rejection | timeout
//! ```
//!
//! # Design Decisions
//! - The subsystem is reached through a trait object fixed at startup
//! - Timeouts are distinct from subsystem errors
//! - No retries and no deduplication

pub mod dispatcher;
pub mod http_client;
pub mod mailbox;
pub mod subsystem;

pub use dispatcher::{DispatchError, Dispatcher};
pub use http_client::HttpSubsystem;
pub use mailbox::{Envelope, Mailbox, Reply};
pub use subsystem::{ProcessingSubsystem, SubsystemError, SubsystemResult};
