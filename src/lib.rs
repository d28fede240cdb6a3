//! Learner gateway library.
//!
//! A command-dispatch façade for the learner and badging APIs: inbound
//! requests are normalized into commands, validated per operation, sent to
//! the processing subsystem with a bounded wait, and translated back into a
//! uniform response envelope.

pub mod auth;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
