//! Fixtures shared by the health unit tests.

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;

use crate::config::{CheckerOptions, PeerConfig, ZoneConfig};
use crate::health::{CheckerContext, CheckerSettings};
use crate::store::{MemoryStore, SharedStore, StoreError, StoreResult};
use crate::upstream::StaticRegistry;

pub fn zone_config(zone: &str, peers: &[&str]) -> ZoneConfig {
    ZoneConfig {
        name: zone.to_string(),
        peers: peers
            .iter()
            .map(|name| PeerConfig {
                name: name.to_string(),
                ..PeerConfig::default()
            })
            .collect(),
    }
}

pub fn options(zone: &str, fall: u32, rise: u32) -> CheckerOptions {
    CheckerOptions {
        shm: Some("healthcheck".into()),
        zone: Some(zone.into()),
        kind: Some("http".into()),
        http_req: Some("GET /status HTTP/1.0\r\nHost: test\r\n\r\n".into()),
        interval: Some(50),
        timeout: Some(200),
        fall: Some(fall),
        rise: Some(rise),
        valid_statuses: Some(vec![200]),
        concurrency: None,
    }
}

pub fn context(
    zone: &str,
    peers: &[&str],
    fall: u32,
    rise: u32,
) -> (CheckerContext, Arc<MemoryStore>, Arc<StaticRegistry>) {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(StaticRegistry::new(&[zone_config(zone, peers)]));
    let settings = CheckerSettings::from_options(&options(zone, fall, rise)).unwrap();
    let ctx = CheckerContext::new(store.clone(), registry.clone(), settings);
    (ctx, store, registry)
}

/// A store whose every operation fails.
#[derive(Debug)]
pub struct FailingStore;

#[async_trait]
impl SharedStore for FailingStore {
    async fn get(&self, _key: &str) -> StoreResult<Option<i64>> {
        Err(StoreError::Unavailable("down for test".into()))
    }

    async fn set(&self, _key: &str, _value: i64) -> StoreResult<()> {
        Err(StoreError::Unavailable("down for test".into()))
    }

    async fn add(&self, _key: &str, _value: i64, _ttl: Option<Duration>) -> StoreResult<()> {
        Err(StoreError::Unavailable("down for test".into()))
    }

    async fn incr(&self, _key: &str, _delta: i64) -> StoreResult<i64> {
        Err(StoreError::Unavailable("down for test".into()))
    }
}
