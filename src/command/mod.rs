//! Command construction subsystem.
//!
//! # Data Flow
//! ```text
//! buffered body + path params + identity
//!     → normalize.rs (canonical Command)
//!     → validate.rs (per-operation rules, payload shaping)
//!     → Command ready for dispatch
//! ```
//!
//! # Design Decisions
//! - Validation is a rule table keyed by operation
//! - Neither step performs I/O or touches shared state
//! - JSON `null` is treated as an absent field everywhere

pub mod error;
pub mod normalize;
pub mod types;
pub mod validate;

pub use error::{ErrorCode, ParseError, ValidationError};
pub use normalize::{FilePart, Inbound, MultipartForm, Normalizer, RawBody};
pub use types::{keys, Command, Environment, Field, Operation, Payload};
pub use validate::validate;
