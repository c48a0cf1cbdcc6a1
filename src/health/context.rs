//! Per-(worker, zone) checker context.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::health::CheckerSettings;
use crate::store::SharedStore;
use crate::upstream::{Peer, UpstreamRegistry};

/// What every probe task of a zone shares.
///
/// Lives as long as the checker; only the owning worker's cycles touch it.
#[derive(Debug)]
pub struct CheckerContext {
    pub zone: String,
    pub store: Arc<dyn SharedStore>,
    pub registry: Arc<dyn UpstreamRegistry>,
    pub settings: CheckerSettings,
    /// Set when this worker changed a peer's state and has not yet
    /// published a new version.
    new_version: AtomicBool,
}

impl CheckerContext {
    pub fn new(
        store: Arc<dyn SharedStore>,
        registry: Arc<dyn UpstreamRegistry>,
        settings: CheckerSettings,
    ) -> Self {
        Self {
            zone: settings.zone.clone(),
            store,
            registry,
            settings,
            new_version: AtomicBool::new(false),
        }
    }

    /// Flag an unpublished state change.
    pub fn mark_new_version(&self) {
        self.new_version.store(true, Ordering::Release);
    }

    /// Whether an unpublished state change is pending.
    pub fn has_new_version(&self) -> bool {
        self.new_version.load(Ordering::Acquire)
    }

    /// Clear the flag, returning whether it was set.
    pub fn take_new_version(&self) -> bool {
        self.new_version.swap(false, Ordering::AcqRel)
    }
}

/// The part of a checker that moves through cycles by value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneState {
    pub peers: Vec<Peer>,
    /// Last zone version this worker saw or published.
    pub version: i64,
}

impl ZoneState {
    pub fn new(peers: Vec<Peer>) -> Self {
        Self { peers, version: 0 }
    }
}
