//! Peer abstraction.
//!
//! # Responsibilities
//! - Represent a single backend endpoint of a zone
//! - Derive the dial target (host/port) from the peer name once
//! - Carry registry metadata through untouched
//! - Hold the locally known down flag

use std::time::Duration;
use serde::Serialize;

use crate::config::PeerConfig;

/// A single backend server within a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Peer {
    /// Dial target and identity within the zone.
    pub name: String,
    /// Host part of `name` when it has the `<host>:<port>` shape.
    pub host: Option<String>,
    /// Port part of `name` when it has the `<host>:<port>` shape.
    pub port: Option<u16>,
    pub weight: u32,
    pub max_fails: u32,
    #[serde(with = "duration_secs")]
    pub fail_timeout: Duration,
    /// Backup peers only receive traffic when every primary peer is down.
    pub backup: bool,
    /// Marked down by the health checker.
    pub down: bool,
}

impl Peer {
    /// Create an up peer with default metadata.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let (host, port) = match split_host_port(&name) {
            Some((host, port)) => (Some(host.to_string()), Some(port)),
            None => (None, None),
        };
        Self {
            name,
            host,
            port,
            weight: 1,
            max_fails: 1,
            fail_timeout: Duration::from_secs(10),
            backup: false,
            down: false,
        }
    }

    /// Build a peer from its configuration entry.
    pub fn from_config(config: &PeerConfig) -> Self {
        Self {
            weight: config.weight,
            max_fails: config.max_fails,
            fail_timeout: Duration::from_secs(config.fail_timeout_secs),
            backup: config.backup,
            ..Self::new(config.name.clone())
        }
    }

    /// Re-derive `host`/`port` from `name`.
    ///
    /// Registries may hand back peers without the derived fields filled in.
    pub fn resolve_target(&mut self) {
        match split_host_port(&self.name) {
            Some((host, port)) => {
                self.host = Some(host.to_string());
                self.port = Some(port);
            }
            None => {
                self.host = None;
                self.port = None;
            }
        }
    }

    /// Return true unless the peer is marked down.
    pub fn is_up(&self) -> bool {
        !self.down
    }
}

/// Split `<host>:<port>` at the last colon. The port must be all digits.
///
/// Bracketed IPv6 hosts (`[::1]:80`) lose their brackets.
pub fn split_host_port(name: &str) -> Option<(&str, u16)> {
    let (host, port) = name.rsplit_once(':')?;
    if host.is_empty() || port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let port = port.parse().ok()?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    Some((host, port))
}

/// Carry `down` flags forward by name from `previous` into a freshly fetched list.
///
/// Derived targets are recomputed for every refreshed peer.
pub fn carry_forward(mut fresh: Vec<Peer>, previous: &[Peer]) -> Vec<Peer> {
    for peer in &mut fresh {
        peer.resolve_target();
        if let Some(old) = previous.iter().find(|p| p.name == peer.name) {
            peer.down = peer.down || old.down;
        }
    }
    fresh
}

mod duration_secs {
    use std::time::Duration;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }
}
