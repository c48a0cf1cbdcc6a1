//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DaemonConfig (validated, immutable)
//!     → startup builds stores, workers and checkers from it
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → zone membership swapped into every worker's registry
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; reload replaces zone membership only
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Checker options stay loosely typed here and are validated once by
//!   the scheduler into `CheckerSettings`

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::DaemonConfig;
pub use schema::AdminConfig;
pub use schema::CheckerOptions;
pub use schema::ObservabilityConfig;
pub use schema::PeerConfig;
pub use schema::StoreConfig;
pub use schema::ZoneConfig;
