//! Checker scheduler.
//!
//! # Responsibilities
//! - Validate activation options and spawn one recurring job per zone
//! - Drive each cycle: sync versions → leader lock → probe → publish
//! - Refresh the peer list after every cycle and re-arm the timer
//! - Keep per-zone counts of active checkers for reporting
//!
//! # Design Decisions
//! - Activation is asynchronous: spawn returns before the first cycle runs
//! - A cycle runs in its own task; a panic in it is logged and the
//!   checker keeps going
//! - The wait for the next cycle races the worker's shutdown signal
//! - Active-checker counts belong to the scheduler, one table per worker

use std::collections::HashMap;
use std::sync::Arc;
use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time;
use tracing::Instrument;

use crate::config::CheckerOptions;
use crate::health::{leader, prober, version};
use crate::health::{CheckerContext, CheckerError, CheckerSettings, ZoneState};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::store::SharedStore;
use crate::upstream::peer::carry_forward;
use crate::upstream::UpstreamRegistry;

/// Number of running checkers per zone.
#[derive(Debug, Default)]
pub struct ActiveCheckers {
    counts: DashMap<String, usize>,
}

impl ActiveCheckers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, zone: &str) -> usize {
        let mut count = self.counts.entry(zone.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn decrement(&self, zone: &str) -> usize {
        match self.counts.get_mut(zone) {
            Some(mut count) => {
                *count = count.saturating_sub(1);
                *count
            }
            None => 0,
        }
    }

    pub fn get(&self, zone: &str) -> usize {
        self.counts.get(zone).map_or(0, |count| *count)
    }
}

/// Result of one check cycle.
#[derive(Debug)]
pub struct CycleOutcome {
    pub state: ZoneState,
    /// This worker held the lock and probed.
    pub leader: bool,
}

/// Owns the checkers of one worker.
#[derive(Debug)]
pub struct Scheduler {
    worker: usize,
    stores: HashMap<String, Arc<dyn SharedStore>>,
    registry: Arc<dyn UpstreamRegistry>,
    active: Arc<ActiveCheckers>,
    shutdown: Shutdown,
}

impl Scheduler {
    /// Create a scheduler for `worker`, resolving `shm` names against `stores`.
    pub fn new(
        worker: usize,
        stores: HashMap<String, Arc<dyn SharedStore>>,
        registry: Arc<dyn UpstreamRegistry>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            worker,
            stores,
            registry,
            active: Arc::new(ActiveCheckers::new()),
            shutdown,
        }
    }

    pub fn worker(&self) -> usize {
        self.worker
    }

    pub fn registry(&self) -> &Arc<dyn UpstreamRegistry> {
        &self.registry
    }

    pub fn active_checkers(&self) -> &Arc<ActiveCheckers> {
        &self.active
    }

    /// Validate `options` and start checking the zone.
    ///
    /// Returns once the recurring job is armed; the first cycle runs
    /// immediately afterwards on the ambient runtime.
    pub async fn spawn_checker(&self, options: &CheckerOptions) -> Result<(), CheckerError> {
        let settings = CheckerSettings::from_options(options)?;

        let store = self
            .stores
            .get(&settings.shm)
            .cloned()
            .ok_or_else(|| CheckerError::UnknownStore(settings.shm.clone()))?;

        let peers = self.registry.describe_zone(&settings.zone).await?;
        let peers = carry_forward(peers, &[]);

        let runtime = Handle::try_current().map_err(|e| CheckerError::Timer(e.to_string()))?;

        let ctx = Arc::new(CheckerContext::new(store, Arc::clone(&self.registry), settings));
        let zone = ctx.zone.clone();

        tracing::info!(
            worker = self.worker,
            zone = %zone,
            peers = peers.len(),
            interval_ms = ctx.settings.interval.as_millis() as u64,
            concurrency = ctx.settings.concurrency,
            "Spawning health checker"
        );

        let active = self.active.increment(&zone);
        metrics::record_active_checkers(&zone, active);

        let span = tracing::info_span!("checker", worker = self.worker, zone = %zone);
        runtime.spawn(
            run_checker(ctx, ZoneState::new(peers), self.shutdown.subscribe(), Arc::clone(&self.active))
                .instrument(span),
        );
        Ok(())
    }
}

/// The recurring job of one checker.
async fn run_checker(
    ctx: Arc<CheckerContext>,
    mut state: ZoneState,
    mut shutdown: broadcast::Receiver<()>,
    active: Arc<ActiveCheckers>,
) {
    loop {
        let (previous, version) = (state.peers.clone(), state.version);
        state = match tokio::spawn(run_cycle(Arc::clone(&ctx), state)).await {
            Ok(outcome) => outcome.state,
            Err(e) => {
                tracing::error!(error = %e, "Failed to run health check cycle");
                ZoneState { peers: previous, version }
            }
        };

        refresh_peers(&ctx, &mut state).await;

        tokio::select! {
            _ = time::sleep(ctx.settings.interval) => {}
            signal = shutdown.recv() => {
                match signal {
                    Ok(()) | Err(RecvError::Lagged(_)) => {
                        tracing::debug!("Worker shutting down, checker stopped");
                    }
                    Err(RecvError::Closed) => {
                        tracing::error!("Failed to schedule next check cycle: shutdown channel closed");
                    }
                }
                break;
            }
        }
    }

    let remaining = active.decrement(&ctx.zone);
    metrics::record_active_checkers(&ctx.zone, remaining);
}

/// Run one check cycle.
pub async fn run_cycle(ctx: Arc<CheckerContext>, mut state: ZoneState) -> CycleOutcome {
    tracing::debug!(zone = %ctx.zone, "Running health check cycle");

    version::sync_versions(&ctx, &mut state).await;

    let leader = leader::try_acquire(ctx.store.as_ref(), &ctx.zone, ctx.settings.interval).await;
    if leader {
        let peers = std::mem::take(&mut state.peers);
        state.peers = prober::probe_all(&ctx, peers).await;
    }

    version::publish_version(&ctx, &mut state).await;

    metrics::record_cycle(&ctx.zone, leader);
    CycleOutcome { state, leader }
}

/// Re-read the zone's peers, keeping known down flags.
///
/// On a registry error the previous list is kept.
pub async fn refresh_peers(ctx: &CheckerContext, state: &mut ZoneState) {
    match ctx.registry.describe_zone(&ctx.zone).await {
        Ok(fresh) => state.peers = carry_forward(fresh, &state.peers),
        Err(e) => tracing::error!(zone = %ctx.zone, error = %e, "Failed to refresh peers"),
    }
}
