//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Components produce:
//!     → logging.rs (structured log events, per-component spans)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows from the HTTP layer into every command
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
