//! Upstream registry subsystem.
//!
//! # Data Flow
//! ```text
//! config zones ([[zones]] / [[zones.peers]])
//!     → static_registry.rs (membership snapshot, swapped on reload)
//!     → describe_zone() → Vec<Peer> (peer.rs)
//!     → health checker probes, then set_peer_down() on transitions
//!     → reporting reads describe_zone() live
//! ```
//!
//! # Design Decisions
//! - The registry is authoritative for membership and metadata
//! - Down state is owned by the health checker and the shared store;
//!   the registry only records what the checker writes
//! - Each worker owns its own registry view, like each process of a
//!   load balancer owns its own copy of the upstream table

pub mod peer;
pub mod static_registry;

use async_trait::async_trait;
use thiserror::Error;

pub use peer::Peer;
pub use static_registry::StaticRegistry;

/// Errors returned by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No zone with this name.
    #[error("upstream \"{0}\" not found")]
    UnknownZone(String),

    /// The zone has no peer with this name.
    #[error("peer \"{peer}\" not found in upstream \"{zone}\"")]
    UnknownPeer { zone: String, peer: String },

    /// The registry backend could not serve the request.
    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

/// Lists zones and peers, and accepts down/up writes.
#[async_trait]
pub trait UpstreamRegistry: Send + Sync + std::fmt::Debug {
    /// Names of every known zone.
    async fn list_zones(&self) -> Result<Vec<String>, RegistryError>;

    /// Current peers of a zone, primary peers first, then backup peers.
    async fn describe_zone(&self, zone: &str) -> Result<Vec<Peer>, RegistryError>;

    /// Record the checker's verdict for a peer.
    async fn set_peer_down(&self, zone: &str, peer: &str, down: bool) -> Result<(), RegistryError>;
}
