//! Per-zone, per-cycle leader lock.
//!
//! The lock is a store key added with an expiry one millisecond shy of the
//! cycle interval, so it is always free again by the time the next cycle of
//! any worker fires. A crashed leader therefore costs at most one cycle.

use std::time::Duration;

use crate::store::keys::lock_key;
use crate::store::{SharedStore, StoreError};

/// Subtracted from the interval to get the lock expiry.
pub const LOCK_MARGIN: Duration = Duration::from_millis(1);

/// Try to become the zone's prober for this cycle.
pub async fn try_acquire(store: &dyn SharedStore, zone: &str, interval: Duration) -> bool {
    let ttl = interval.saturating_sub(LOCK_MARGIN);
    match store.add(&lock_key(zone), 1, Some(ttl)).await {
        Ok(()) => true,
        Err(StoreError::Exists) => false,
        Err(e) => {
            tracing::error!(zone, error = %e, "Failed to acquire leader lock");
            false
        }
    }
}
