//! Active health checking for upstream peers.
//!
//! Several cooperating workers share one store. For each zone, one worker
//! per cycle wins a short-lived lock, probes every peer and publishes state
//! changes under a version counter; the other workers adopt those verdicts
//! without probing.

// Core subsystems
pub mod config;
pub mod health;
pub mod store;
pub mod upstream;

// Reporting
pub mod admin;
pub mod report;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::DaemonConfig;
pub use health::Scheduler;
pub use lifecycle::{Daemon, Shutdown};
