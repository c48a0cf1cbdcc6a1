//! Zone status reporting.
//!
//! Everything here is read live from the registry; nothing is cached.
//!
//! ```text
//! Upstream foo.com
//!     Primary Peers
//!         127.0.0.1:12354 UP
//!         127.0.0.1:12355 DOWN
//!     Backup Peers
//!         127.0.0.1:12356 UP
//!
//! Upstream bar.com (NO checkers)
//!     Primary Peers
//!         127.0.0.1:12357 UP
//!     Backup Peers
//! ```

use std::fmt::Write;
use serde::Serialize;

use crate::health::ActiveCheckers;
use crate::upstream::{Peer, RegistryError, UpstreamRegistry};

/// Whether a zone can serve traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneSummary {
    /// At least one peer is up.
    Up,
    Down,
}

impl ZoneSummary {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneSummary::Up => "up",
            ZoneSummary::Down => "down",
        }
    }
}

/// One peer and its checker verdict.
#[derive(Debug, Clone, Serialize)]
pub struct PeerStatus {
    #[serde(flatten)]
    pub peer: Peer,
    /// "UP" or "DOWN".
    pub status: &'static str,
}

impl From<Peer> for PeerStatus {
    fn from(peer: Peer) -> Self {
        let status = if peer.down { "DOWN" } else { "UP" };
        Self { peer, status }
    }
}

/// Every peer of a zone, split into primary and backup peers.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneDetails {
    pub zone: String,
    pub summary: ZoneSummary,
    /// Checkers running for the zone in the reporting worker.
    pub checkers: usize,
    pub primary: Vec<PeerStatus>,
    pub backup: Vec<PeerStatus>,
}

fn summarize(peers: &[Peer]) -> ZoneSummary {
    if peers.iter().any(Peer::is_up) {
        ZoneSummary::Up
    } else {
        ZoneSummary::Down
    }
}

/// "up" if any peer of the zone is up, "down" otherwise.
pub async fn zone_summary(
    registry: &dyn UpstreamRegistry,
    zone: &str,
) -> Result<ZoneSummary, RegistryError> {
    let peers = registry.describe_zone(zone).await?;
    Ok(summarize(&peers))
}

pub async fn zone_details(
    registry: &dyn UpstreamRegistry,
    active: &ActiveCheckers,
    zone: &str,
) -> Result<ZoneDetails, RegistryError> {
    let peers = registry.describe_zone(zone).await?;
    let summary = summarize(&peers);
    let (backup, primary): (Vec<Peer>, Vec<Peer>) = peers.into_iter().partition(|p| p.backup);

    Ok(ZoneDetails {
        zone: zone.to_string(),
        summary,
        checkers: active.get(zone),
        primary: primary.into_iter().map(PeerStatus::from).collect(),
        backup: backup.into_iter().map(PeerStatus::from).collect(),
    })
}

/// Render the text status page for every zone, in registry order.
pub async fn status_page(
    registry: &dyn UpstreamRegistry,
    active: &ActiveCheckers,
) -> Result<String, RegistryError> {
    let zones = registry.list_zones().await?;

    let mut page = String::new();
    for (i, zone) in zones.iter().enumerate() {
        let details = zone_details(registry, active, zone).await?;
        if i > 0 {
            page.push('\n');
        }
        render_zone(&mut page, &details);
    }
    Ok(page)
}

fn render_zone(page: &mut String, details: &ZoneDetails) {
    // Writing to a String cannot fail.
    let _ = write!(page, "Upstream {}", details.zone);
    if details.checkers == 0 {
        page.push_str(" (NO checkers)");
    }
    page.push('\n');

    page.push_str("    Primary Peers\n");
    for peer in &details.primary {
        let _ = writeln!(page, "        {} {}", peer.peer.name, peer.status);
    }
    page.push_str("    Backup Peers\n");
    for peer in &details.backup {
        let _ = writeln!(page, "        {} {}", peer.peer.name, peer.status);
    }
}
