//! Peer health state machine.
//!
//! # States
//! - Up: peer receives traffic
//! - Down: peer excluded from load balancing
//!
//! # State Transitions
//! ```text
//! Up → Down: consecutive failures (nok) >= fall
//! Down → Up: consecutive successes (ok) >= rise
//! ```
//!
//! # Design Decisions
//! - Counters live in the shared store so a new leader continues the streak
//! - The first failure resets the success counter, and vice versa
//! - Each counter update is one atomic store step; store errors are logged
//!   and the step skipped
//! - Every transition marks the context for a version bump

use crate::health::CheckerContext;
use crate::observability::metrics;
use crate::store::keys::{down_key, nok_key, ok_key};
use crate::upstream::Peer;

/// Outcome of recording one probe result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Unchanged,
    TurnedDown,
    TurnedUp,
}

/// Record a failed probe.
pub async fn record_failure(ctx: &CheckerContext, peer: &mut Peer) -> Verdict {
    let Some(fails) = bump_counter(ctx, &nok_key(&ctx.zone, &peer.name)).await else {
        return Verdict::Unchanged;
    };

    if fails == 1 {
        reset_counter(ctx, &ok_key(&ctx.zone, &peer.name)).await;
    }

    if !peer.down && fails >= i64::from(ctx.settings.fall) {
        tracing::warn!(
            zone = %ctx.zone,
            peer = %peer.name,
            failures = fails,
            "Peer is turned down"
        );
        set_peer_down(ctx, peer, true).await;
        return Verdict::TurnedDown;
    }
    Verdict::Unchanged
}

/// Record a successful probe.
pub async fn record_success(ctx: &CheckerContext, peer: &mut Peer) -> Verdict {
    let Some(successes) = bump_counter(ctx, &ok_key(&ctx.zone, &peer.name)).await else {
        return Verdict::Unchanged;
    };

    if successes == 1 {
        reset_counter(ctx, &nok_key(&ctx.zone, &peer.name)).await;
    }

    if peer.down && successes >= i64::from(ctx.settings.rise) {
        tracing::warn!(
            zone = %ctx.zone,
            peer = %peer.name,
            successes,
            "Peer is turned up"
        );
        set_peer_down(ctx, peer, false).await;
        return Verdict::TurnedUp;
    }
    Verdict::Unchanged
}

/// Apply a transition locally, in the registry and in the store.
pub(crate) async fn set_peer_down(ctx: &CheckerContext, peer: &mut Peer, down: bool) {
    peer.down = down;

    if let Err(e) = ctx.registry.set_peer_down(&ctx.zone, &peer.name, down).await {
        tracing::error!(zone = %ctx.zone, peer = %peer.name, error = %e, "Failed to set peer down flag in registry");
    }
    ctx.mark_new_version();

    if let Err(e) = ctx.store.set(&down_key(&ctx.zone, &peer.name), i64::from(down)).await {
        tracing::error!(zone = %ctx.zone, peer = %peer.name, error = %e, "Failed to publish peer down flag");
    }

    metrics::record_peer_state(&ctx.zone, &peer.name, !down);
}

/// Increment a streak counter, creating it at 1. `None` if the store failed
/// before a count could be known.
async fn bump_counter(ctx: &CheckerContext, key: &str) -> Option<i64> {
    match ctx.store.get(key).await {
        Err(e) => {
            tracing::error!(key, error = %e, "Failed to read peer counter");
            None
        }
        Ok(None) => {
            // Racing another writer here only loses an increment.
            if let Err(e) = ctx.store.set(key, 1).await {
                tracing::error!(key, error = %e, "Failed to set peer counter");
            }
            Some(1)
        }
        Ok(Some(current)) => match ctx.store.incr(key, 1).await {
            Ok(next) => Some(next),
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to increment peer counter");
                Some(current.saturating_add(1))
            }
        },
    }
}

/// Zero the opposite streak counter if it holds a streak.
async fn reset_counter(ctx: &CheckerContext, key: &str) {
    match ctx.store.get(key).await {
        Ok(Some(count)) if count != 0 => {
            if let Err(e) = ctx.store.set(key, 0).await {
                tracing::error!(key, error = %e, "Failed to reset peer counter");
            }
        }
        Ok(_) => {}
        Err(e) => tracing::error!(key, error = %e, "Failed to read peer counter"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::test_support::{context, FailingStore};
    use crate::store::SharedStore;
    use crate::upstream::UpstreamRegistry;

    #[tokio::test]
    async fn test_fall_rise_scenario() {
        let (ctx, _store, registry) = context("foo.com", &["127.0.0.1:1"], 3, 2);
        let mut peer = Peer::new("127.0.0.1:1");

        assert_eq!(record_failure(&ctx, &mut peer).await, Verdict::Unchanged);
        assert_eq!(record_failure(&ctx, &mut peer).await, Verdict::Unchanged);
        assert!(!peer.down);
        assert_eq!(record_failure(&ctx, &mut peer).await, Verdict::TurnedDown);
        assert!(peer.down);
        assert!(ctx.has_new_version());

        let listed = registry.describe_zone("foo.com").await.unwrap();
        assert!(listed[0].down);

        assert_eq!(record_success(&ctx, &mut peer).await, Verdict::Unchanged);
        assert!(peer.down);
        assert_eq!(record_success(&ctx, &mut peer).await, Verdict::TurnedUp);
        assert!(!peer.down);

        let listed = registry.describe_zone("foo.com").await.unwrap();
        assert!(!listed[0].down);
    }

    #[tokio::test]
    async fn test_intervening_success_resets_streak() {
        let (ctx, store, _registry) = context("foo.com", &["p:1"], 3, 2);
        let mut peer = Peer::new("p:1");

        record_failure(&ctx, &mut peer).await;
        record_failure(&ctx, &mut peer).await;
        record_success(&ctx, &mut peer).await;
        assert_eq!(store.get("nok:foo.com:p:1").await.unwrap(), Some(0));
        assert_eq!(store.get("ok:foo.com:p:1").await.unwrap(), Some(1));

        record_failure(&ctx, &mut peer).await;
        record_failure(&ctx, &mut peer).await;
        assert!(!peer.down, "streak must restart after a success");
        assert_eq!(store.get("ok:foo.com:p:1").await.unwrap(), Some(0));

        assert_eq!(record_failure(&ctx, &mut peer).await, Verdict::TurnedDown);
        assert_eq!(store.get("d:foo.com:p:1").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_no_repeat_transition() {
        let (ctx, store, _registry) = context("foo.com", &["p:1"], 1, 1);
        let mut peer = Peer::new("p:1");

        assert_eq!(record_failure(&ctx, &mut peer).await, Verdict::TurnedDown);
        assert!(ctx.take_new_version());
        assert_eq!(record_failure(&ctx, &mut peer).await, Verdict::Unchanged);
        assert!(!ctx.has_new_version());
        assert_eq!(store.get("nok:foo.com:p:1").await.unwrap(), Some(2));

        assert_eq!(record_success(&ctx, &mut peer).await, Verdict::TurnedUp);
        assert_eq!(store.get("d:foo.com:p:1").await.unwrap(), Some(0));
        assert_eq!(record_success(&ctx, &mut peer).await, Verdict::Unchanged);
    }

    #[tokio::test]
    async fn test_store_errors_are_no_ops() {
        let (ctx, _store, _registry) = context("foo.com", &["p:1"], 1, 1);
        let ctx = crate::health::CheckerContext::new(
            std::sync::Arc::new(FailingStore),
            ctx.registry.clone(),
            ctx.settings.clone(),
        );
        let mut peer = Peer::new("p:1");

        assert_eq!(record_failure(&ctx, &mut peer).await, Verdict::Unchanged);
        assert!(!peer.down);
        assert!(!ctx.has_new_version());
    }

    #[tokio::test]
    async fn test_saturated_counter_still_transitions() {
        let (ctx, store, _registry) = context("foo.com", &["p:1"], 2, 1);
        let mut peer = Peer::new("p:1");
        store.set("nok:foo.com:p:1", i64::MAX).await.unwrap();

        assert_eq!(record_failure(&ctx, &mut peer).await, Verdict::TurnedDown);
        assert!(peer.down);
        assert_eq!(store.get("nok:foo.com:p:1").await.unwrap(), Some(i64::MAX));
    }
}
