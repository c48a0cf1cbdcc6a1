//! Active health checking subsystem.
//!
//! # Data Flow
//! ```text
//! checker.rs (recurring job per zone, per worker)
//!     → version.rs: adopt verdicts published by other workers
//!     → leader.rs: one worker per zone wins the cycle
//!     → prober.rs: fan peers out over `concurrency` ranges (leader only)
//!         → probe.rs: connect, send request, read status line
//!         → state.rs: ok/nok streaks, Up ←→ Down with fall/rise
//!     → version.rs: publish a new zone version if anything changed
//!     → refresh peers from the registry, sleep `interval`, repeat
//! ```
//!
//! # Design Decisions
//! - Workers share nothing but the store; all coordination is atomic
//!   store operations
//! - State transitions require consecutive successes/failures
//! - Non-leaders never probe; they follow the version counter
//! - Probe failures never abort a cycle, store failures are no-ops

pub mod checker;
pub mod context;
pub mod leader;
pub mod probe;
pub mod prober;
pub mod settings;
pub mod state;
pub mod version;

#[cfg(test)]
pub(crate) mod test_support;

pub use checker::{run_cycle, ActiveCheckers, CycleOutcome, Scheduler};
pub use context::{CheckerContext, ZoneState};
pub use settings::{CheckerError, CheckerSettings, ProbeKind};
pub use state::Verdict;
