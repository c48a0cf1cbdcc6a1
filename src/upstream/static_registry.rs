//! Registry backed by the configured zone table.
//!
//! # Responsibilities
//! - Serve zone membership from the config
//! - Swap membership atomically on config reload
//! - Remember down flags written by the checker, per (zone, peer)

use std::collections::HashMap;
use std::sync::Arc;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::config::ZoneConfig;
use crate::upstream::{Peer, RegistryError, UpstreamRegistry};

/// Registry over a static, reloadable zone table.
#[derive(Debug)]
pub struct StaticRegistry {
    /// Zone name -> peers, in configuration order.
    zones: ArcSwap<Vec<(String, Vec<Peer>)>>,
    /// (zone, peer) -> down.
    down: DashMap<(String, String), bool>,
}

impl StaticRegistry {
    /// Build a registry from zone configuration.
    pub fn new(configs: &[ZoneConfig]) -> Self {
        Self {
            zones: ArcSwap::from_pointee(Self::build(configs)),
            down: DashMap::new(),
        }
    }

    /// Replace zone membership.
    ///
    /// Down flags survive for peers still present; flags of removed peers
    /// are dropped.
    pub fn replace_zones(&self, configs: &[ZoneConfig]) {
        let zones = Self::build(configs);
        let live: HashMap<&str, Vec<&str>> = zones
            .iter()
            .map(|(zone, peers)| (zone.as_str(), peers.iter().map(|p| p.name.as_str()).collect()))
            .collect();

        self.down.retain(|(zone, peer), _| {
            live.get(zone.as_str())
                .map_or(false, |peers| peers.contains(&peer.as_str()))
        });

        tracing::info!(zones = zones.len(), "Upstream registry reloaded");
        self.zones.store(Arc::new(zones));
    }

    fn build(configs: &[ZoneConfig]) -> Vec<(String, Vec<Peer>)> {
        configs
            .iter()
            .map(|zone| {
                // Primary peers first, then backups, each in config order.
                let (primary, backup): (Vec<Peer>, Vec<Peer>) = zone
                    .peers
                    .iter()
                    .map(Peer::from_config)
                    .partition(|p| !p.backup);
                let mut peers = primary;
                peers.extend(backup);
                (zone.name.clone(), peers)
            })
            .collect()
    }
}

#[async_trait]
impl UpstreamRegistry for StaticRegistry {
    async fn list_zones(&self) -> Result<Vec<String>, RegistryError> {
        Ok(self.zones.load().iter().map(|(name, _)| name.clone()).collect())
    }

    async fn describe_zone(&self, zone: &str) -> Result<Vec<Peer>, RegistryError> {
        let zones = self.zones.load();
        let (_, peers) = zones
            .iter()
            .find(|(name, _)| name == zone)
            .ok_or_else(|| RegistryError::UnknownZone(zone.to_string()))?;

        Ok(peers
            .iter()
            .map(|peer| {
                let mut peer = peer.clone();
                if let Some(down) = self.down.get(&(zone.to_string(), peer.name.clone())) {
                    peer.down = *down;
                }
                peer
            })
            .collect())
    }

    async fn set_peer_down(&self, zone: &str, peer: &str, down: bool) -> Result<(), RegistryError> {
        let zones = self.zones.load();
        let (_, peers) = zones
            .iter()
            .find(|(name, _)| name == zone)
            .ok_or_else(|| RegistryError::UnknownZone(zone.to_string()))?;

        if !peers.iter().any(|p| p.name == peer) {
            return Err(RegistryError::UnknownPeer {
                zone: zone.to_string(),
                peer: peer.to_string(),
            });
        }

        self.down.insert((zone.to_string(), peer.to_string()), down);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PeerConfig;

    fn zone(name: &str, peers: &[(&str, bool)]) -> ZoneConfig {
        ZoneConfig {
            name: name.to_string(),
            peers: peers
                .iter()
                .map(|(peer, backup)| PeerConfig {
                    name: peer.to_string(),
                    backup: *backup,
                    ..PeerConfig::default()
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_describe_orders_primary_first() {
        let registry = StaticRegistry::new(&[zone(
            "foo.com",
            &[("b1:80", true), ("p1:80", false), ("p2:80", false)],
        )]);

        let peers = registry.describe_zone("foo.com").await.unwrap();
        let names: Vec<_> = peers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["p1:80", "p2:80", "b1:80"]);
        assert!(peers[2].backup);
    }

    #[tokio::test]
    async fn test_unknown_zone_and_peer() {
        let registry = StaticRegistry::new(&[zone("foo.com", &[("p1:80", false)])]);

        assert_eq!(
            registry.describe_zone("bar.com").await,
            Err(RegistryError::UnknownZone("bar.com".into()))
        );
        assert!(matches!(
            registry.set_peer_down("foo.com", "nope:1", true).await,
            Err(RegistryError::UnknownPeer { .. })
        ));
    }

    #[tokio::test]
    async fn test_down_flags_survive_reload() {
        let registry = StaticRegistry::new(&[zone("foo.com", &[("p1:80", false), ("p2:80", false)])]);
        registry.set_peer_down("foo.com", "p1:80", true).await.unwrap();
        registry.set_peer_down("foo.com", "p2:80", true).await.unwrap();

        registry.replace_zones(&[zone("foo.com", &[("p1:80", false), ("p3:80", false)])]);
        let peers = registry.describe_zone("foo.com").await.unwrap();
        assert!(peers[0].down);
        assert!(!peers[1].down);

        // p2 came back after being removed: it starts up.
        registry.replace_zones(&[zone("foo.com", &[("p2:80", false)])]);
        let peers = registry.describe_zone("foo.com").await.unwrap();
        assert!(!peers[0].down);
    }
}
