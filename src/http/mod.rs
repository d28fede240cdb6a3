//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, pipeline)
//!     → preflight.rs (OPTIONS answered before routing)
//!     → learner.rs / badge.rs (extract body, path params, headers)
//!     → command + dispatch subsystems
//!     → response.rs (envelope, status mapping)
//!     → Send to client
//! ```

pub mod badge;
pub mod learner;
pub mod preflight;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestContext, X_REQUEST_ID};
pub use response::{ApiError, ErrorBody, ResponseEnvelope, Status, Translator};
pub use server::{AppState, HttpServer};
