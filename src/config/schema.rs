//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the daemon.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the health-check daemon.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Number of cooperating workers sharing the stores.
    pub workers: usize,

    /// Named shared stores checkers coordinate through.
    pub stores: Vec<StoreConfig>,

    /// Upstream zones and their peers.
    pub zones: Vec<ZoneConfig>,

    /// One entry per checker to spawn on every worker.
    pub checkers: Vec<CheckerOptions>,

    /// Admin / status endpoint settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            stores: vec![StoreConfig::default()],
            zones: Vec::new(),
            checkers: Vec::new(),
            admin: AdminConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// A named shared store.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Name checkers refer to through their `shm` option.
    pub name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "healthcheck".to_string(),
        }
    }
}

/// Upstream zone definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ZoneConfig {
    /// Zone identifier.
    pub name: String,

    /// Peers of the zone, in order.
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
}

/// Peer definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PeerConfig {
    /// Peer address (e.g., "127.0.0.1:3000" or "unix:/run/app.sock").
    pub name: String,

    /// Weight for weighted load balancing (default: 1).
    #[serde(default = "default_weight")]
    pub weight: u32,

    /// Passive failure budget, passed through to the load balancer.
    #[serde(default = "default_max_fails")]
    pub max_fails: u32,

    /// Passive failure window in seconds, passed through.
    #[serde(default = "default_fail_timeout_secs")]
    pub fail_timeout_secs: u64,

    /// Backup peer.
    #[serde(default)]
    pub backup: bool,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            weight: default_weight(),
            max_fails: default_max_fails(),
            fail_timeout_secs: default_fail_timeout_secs(),
            backup: false,
        }
    }
}

fn default_weight() -> u32 {
    1
}

fn default_max_fails() -> u32 {
    1
}

fn default_fail_timeout_secs() -> u64 {
    10
}

/// Raw activation options of one checker.
///
/// Every field is optional here; [`crate::health::CheckerSettings`] applies
/// defaults and rejects missing required options.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckerOptions {
    /// Name of the shared store.
    pub shm: Option<String>,

    /// Zone to check.
    pub zone: Option<String>,

    /// Probe type; only "http" is supported.
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Raw request bytes sent to every peer.
    pub http_req: Option<String>,

    /// Cycle interval in milliseconds (default 1000, floor 2).
    pub interval: Option<u64>,

    /// Connect/send/receive timeout in milliseconds (default 1000).
    pub timeout: Option<u64>,

    /// Consecutive failures before a peer is turned down (default 5).
    pub fall: Option<u32>,

    /// Consecutive successes before a peer is turned up (default 2).
    pub rise: Option<u32>,

    /// Accepted status codes; absent means any status line is accepted.
    pub valid_statuses: Option<Vec<u16>>,

    /// Probe concurrency budget (default 1).
    pub concurrency: Option<usize>,
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin endpoint.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin endpoint bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
