//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Stores → Workers (registry + scheduler each)
//!     → Spawn every checker on every worker
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → every checker stops at its next re-arm
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: stores first, then workers, then checkers
//! - Any checker that fails to spawn aborts startup
//! - Checkers finish their current cycle before stopping

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{Daemon, StartupError, Worker};
