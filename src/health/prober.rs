//! Bounded-concurrency fan-out of probes over a peer list.
//!
//! # Responsibilities
//! - Partition the peer list into contiguous ranges
//! - Run every range but the last on its own task, the last on the caller
//! - Join all ranges and reassemble the list in order
//!
//! # Design Decisions
//! - Ranges are probed sequentially, so a stuck peer only stalls its range
//!   and only for the probe timeout
//! - At most `concurrency` ranges exist, the caller included
//! - Peers move into their task by value and come back with it

use std::ops::Range;
use std::sync::Arc;
use futures_util::future::join_all;

use crate::health::{probe, CheckerContext};
use crate::upstream::Peer;

/// Split `0..n` into the ranges probed concurrently.
///
/// - `concurrency <= 1`: one range, probed sequentially.
/// - `n <= concurrency`: one range per peer.
/// - otherwise: ranges of `ceil(n / concurrency)`, the last possibly shorter.
pub fn partition(n: usize, concurrency: usize) -> Vec<Range<usize>> {
    if n == 0 {
        return Vec::new();
    }
    if concurrency <= 1 {
        return vec![0..n];
    }
    if n <= concurrency {
        return (0..n).map(|i| i..i + 1).collect();
    }

    let group_size = n.div_ceil(concurrency);
    (0..n)
        .step_by(group_size)
        .map(|start| start..(start + group_size).min(n))
        .collect()
}

/// Probe every peer exactly once, within the context's concurrency budget.
pub async fn probe_all(ctx: &Arc<CheckerContext>, peers: Vec<Peer>) -> Vec<Peer> {
    let total = peers.len();
    let ranges = partition(total, ctx.settings.concurrency);

    let mut peers = peers.into_iter();
    let mut chunks: Vec<Vec<Peer>> = ranges
        .iter()
        .map(|range| peers.by_ref().take(range.len()).collect())
        .collect();
    let Some(last) = chunks.pop() else {
        return Vec::new();
    };

    let mut fallbacks = Vec::with_capacity(chunks.len());
    let mut tasks = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        fallbacks.push(chunk.clone());
        let ctx = Arc::clone(ctx);
        tasks.push(tokio::spawn(async move { probe_range(&ctx, chunk).await }));
    }

    let last = probe_range(ctx, last).await;

    let mut probed = Vec::with_capacity(total);
    for (joined, fallback) in join_all(tasks).await.into_iter().zip(fallbacks) {
        match joined {
            Ok(chunk) => probed.extend(chunk),
            Err(e) => {
                tracing::error!(zone = %ctx.zone, error = %e, "Probe task failed");
                probed.extend(fallback);
            }
        }
    }
    probed.extend(last);
    probed
}

async fn probe_range(ctx: &CheckerContext, mut peers: Vec<Peer>) -> Vec<Peer> {
    for peer in &mut peers {
        probe::probe(ctx, peer).await;
    }
    peers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(n: usize, concurrency: usize) -> Vec<usize> {
        partition(n, concurrency).iter().map(|r| r.len()).collect()
    }

    #[test]
    fn test_partition_shapes() {
        assert!(partition(0, 4).is_empty());
        assert_eq!(sizes(5, 1), vec![5]);
        assert_eq!(sizes(5, 0), vec![5]);
        assert_eq!(sizes(3, 3), vec![1, 1, 1]);
        assert_eq!(sizes(2, 8), vec![1, 1]);
        assert_eq!(sizes(5, 2), vec![3, 2]);
        assert_eq!(sizes(10, 3), vec![4, 4, 2]);
        assert_eq!(sizes(7, 7), vec![1; 7]);
    }

    #[test]
    fn test_partition_covers_exactly_once_within_budget() {
        for n in 0..64 {
            for concurrency in 0..20 {
                let ranges = partition(n, concurrency);
                assert!(ranges.len() <= concurrency.max(1), "n={n} c={concurrency}");

                let mut next = 0;
                for range in &ranges {
                    assert_eq!(range.start, next, "ranges must be contiguous");
                    assert!(!range.is_empty());
                    next = range.end;
                }
                assert_eq!(next, n, "ranges must cover every peer");
            }
        }
    }
}
