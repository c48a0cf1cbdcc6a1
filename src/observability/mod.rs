//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Checkers produce:
//!     → logging.rs (structured log events, one span per checker)
//!     → metrics.rs (probe counters, peer and version gauges)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
