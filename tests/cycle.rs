//! Check cycles of cooperating workers sharing one store.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use common::{closed_addr, start_mock_backend, start_programmable_backend, BackendStats};
use upstream_health::config::{CheckerOptions, PeerConfig, ZoneConfig};
use upstream_health::health::{run_cycle, CheckerContext, CheckerSettings, ZoneState};
use upstream_health::store::{MemoryStore, SharedStore};
use upstream_health::upstream::{StaticRegistry, UpstreamRegistry};

const ZONE: &str = "foo.com";

fn zone(peers: &[SocketAddr]) -> Vec<ZoneConfig> {
    vec![ZoneConfig {
        name: ZONE.to_string(),
        peers: peers
            .iter()
            .map(|addr| PeerConfig {
                name: addr.to_string(),
                ..PeerConfig::default()
            })
            .collect(),
    }]
}

fn options(fall: u32, concurrency: usize) -> CheckerOptions {
    CheckerOptions {
        shm: Some("healthcheck".into()),
        zone: Some(ZONE.into()),
        kind: Some("http".into()),
        http_req: Some("GET /status HTTP/1.0\r\nHost: foo.com\r\n\r\n".into()),
        interval: Some(1000),
        timeout: Some(500),
        fall: Some(fall),
        rise: Some(1),
        valid_statuses: Some(vec![200]),
        concurrency: Some(concurrency),
    }
}

/// One worker's view: its own registry, the shared store.
async fn worker(
    store: &Arc<MemoryStore>,
    zones: &[ZoneConfig],
    options: &CheckerOptions,
) -> (Arc<CheckerContext>, ZoneState, Arc<StaticRegistry>) {
    let registry = Arc::new(StaticRegistry::new(zones));
    let settings = CheckerSettings::from_options(options).unwrap();
    let peers = registry.describe_zone(ZONE).await.unwrap();
    let ctx = Arc::new(CheckerContext::new(store.clone(), registry.clone(), settings));
    (ctx, ZoneState::new(peers), registry)
}

#[tokio::test]
async fn test_leader_verdict_reaches_follower_without_probing() {
    let (live, stats) = start_mock_backend(200).await;
    let dead = closed_addr().await;
    let zones = zone(&[live, dead]);
    let store = Arc::new(MemoryStore::new());

    let (leader_ctx, leader_state, leader_registry) = worker(&store, &zones, &options(1, 1)).await;
    let (follower_ctx, follower_state, follower_registry) =
        worker(&store, &zones, &options(1, 1)).await;

    let outcome = run_cycle(leader_ctx, leader_state).await;
    assert!(outcome.leader);
    assert_eq!(outcome.state.version, 1);
    assert!(!outcome.state.peers[0].down);
    assert!(outcome.state.peers[1].down);
    assert_eq!(stats.connections(), 1);

    let listed = leader_registry.describe_zone(ZONE).await.unwrap();
    assert!(listed[1].down);
    assert_eq!(store.get(&format!("d:{}:{}", ZONE, dead)).await.unwrap(), Some(1));

    // Same window: the lock is still held, the follower only syncs.
    let outcome = run_cycle(follower_ctx, follower_state).await;
    assert!(!outcome.leader);
    assert_eq!(outcome.state.version, 1);
    assert!(outcome.state.peers[1].down);
    assert_eq!(stats.connections(), 1, "follower must not probe");

    let listed = follower_registry.describe_zone(ZONE).await.unwrap();
    assert!(!listed[0].down);
    assert!(listed[1].down);
    assert_eq!(store.get(&format!("v:{}", ZONE)).await.unwrap(), Some(1));
}

#[tokio::test]
async fn test_held_lock_still_syncs() {
    let (live, stats) = start_mock_backend(200).await;
    let zones = zone(&[live]);
    let store = Arc::new(MemoryStore::new());

    store.set(&format!("l:{}", ZONE), 1).await.unwrap();
    store.set(&format!("d:{}:{}", ZONE, live), 1).await.unwrap();
    store.set(&format!("v:{}", ZONE), 7).await.unwrap();

    let (ctx, state, registry) = worker(&store, &zones, &options(1, 1)).await;
    let outcome = run_cycle(ctx, state).await;

    assert!(!outcome.leader);
    assert_eq!(outcome.state.version, 7);
    assert!(outcome.state.peers[0].down);
    assert!(registry.describe_zone(ZONE).await.unwrap()[0].down);
    assert_eq!(stats.connections(), 0);
}

#[tokio::test]
async fn test_probe_concurrency_is_bounded() {
    let stats = Arc::new(BackendStats::default());
    let mut addrs = Vec::new();
    for _ in 0..5 {
        let addr = start_programmable_backend(stats.clone(), || async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            200
        })
        .await;
        addrs.push(addr);
    }

    let store = Arc::new(MemoryStore::new());
    let (ctx, state, _registry) = worker(&store, &zone(&addrs), &options(1, 2)).await;
    let outcome = run_cycle(ctx, state).await;

    assert!(outcome.leader);
    assert_eq!(stats.connections(), 5);
    assert!(stats.max_in_flight() <= 2, "max in flight was {}", stats.max_in_flight());
    let names: Vec<String> = outcome.state.peers.iter().map(|p| p.name.clone()).collect();
    let expected: Vec<String> = addrs.iter().map(|a| a.to_string()).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_no_change_publishes_nothing() {
    let (live, _stats) = start_mock_backend(200).await;
    let store = Arc::new(MemoryStore::new());

    let (ctx, state, _registry) = worker(&store, &zone(&[live]), &options(1, 1)).await;
    let outcome = run_cycle(ctx, state).await;

    assert!(outcome.leader);
    assert_eq!(outcome.state.version, 0);
    assert_eq!(store.get(&format!("v:{}", ZONE)).await.unwrap(), None);
}
