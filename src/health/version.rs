//! Zone version synchronization.
//!
//! # Protocol
//! ```text
//! leader:      state change → dirty flag → cycle end: add v:<zone> 0, incr
//! every cycle: get v:<zone> > local? → read d:<zone>:<peer> for all peers
//!                                     → adopt down flags, local = stored
//! ```
//!
//! Non-leaders never probe; they converge on the leader's verdicts within
//! one interval by ingesting the version.

use crate::health::{CheckerContext, ZoneState};
use crate::observability::metrics;
use crate::store::keys::{down_key, version_key};
use crate::store::StoreError;
use crate::upstream::Peer;

/// Ingest a newer zone version published by another worker.
pub async fn sync_versions(ctx: &CheckerContext, state: &mut ZoneState) {
    let stored = match ctx.store.get(&version_key(&ctx.zone)).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::error!(zone = %ctx.zone, error = %e, "Failed to read zone version");
            return;
        }
    };

    match stored {
        None => {
            // The counter vanished after we had seen it; recreate it.
            if state.version > 0 {
                ctx.mark_new_version();
            }
        }
        Some(stored) if stored > state.version => {
            tracing::debug!(
                zone = %ctx.zone,
                local = state.version,
                stored,
                "Adopting newer zone version"
            );
            adopt_down_flags(ctx, state).await;
            state.version = stored;
            metrics::record_version(&ctx.zone, stored);
        }
        Some(_) => {}
    }
}

async fn adopt_down_flags(ctx: &CheckerContext, state: &mut ZoneState) {
    for peer in &mut state.peers {
        let down = match ctx.store.get(&down_key(&ctx.zone, &peer.name)).await {
            Ok(value) => value.is_some_and(|v| v != 0),
            Err(e) => {
                tracing::error!(zone = %ctx.zone, peer = %peer.name, error = %e, "Failed to read peer down flag");
                continue;
            }
        };

        if peer.down != down {
            set_peer_down_locally(ctx, peer, down).await;
        }
    }
}

/// Mirror another worker's verdict without touching the store or the version.
async fn set_peer_down_locally(ctx: &CheckerContext, peer: &mut Peer, down: bool) {
    peer.down = down;
    if let Err(e) = ctx.registry.set_peer_down(&ctx.zone, &peer.name, down).await {
        tracing::error!(zone = %ctx.zone, peer = %peer.name, error = %e, "Failed to set peer down flag in registry");
    }
    metrics::record_peer_state(&ctx.zone, &peer.name, !down);
}

/// Publish this worker's state changes as a new zone version.
pub async fn publish_version(ctx: &CheckerContext, state: &mut ZoneState) {
    if !ctx.take_new_version() {
        return;
    }

    let key = version_key(&ctx.zone);
    match ctx.store.add(&key, 0, None).await {
        Ok(()) | Err(StoreError::Exists) => {}
        Err(e) => tracing::error!(zone = %ctx.zone, error = %e, "Failed to create zone version"),
    }

    state.version = match ctx.store.incr(&key, 1).await {
        Ok(version) => version,
        Err(e) => {
            tracing::error!(zone = %ctx.zone, error = %e, "Failed to publish zone version");
            state.version + 1
        }
    };

    tracing::debug!(zone = %ctx.zone, version = state.version, "Published zone version");
    metrics::record_version(&ctx.zone, state.version);
}
