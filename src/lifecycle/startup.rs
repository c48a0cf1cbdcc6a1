//! Startup orchestration.
//!
//! # Responsibilities
//! - Create the named shared stores
//! - Create every worker with its own registry view and scheduler
//! - Spawn every configured checker on every worker
//! - Apply reloaded zone membership to all workers
//!
//! # Design Decisions
//! - Fail fast: any checker spawn error is fatal
//! - Workers share the stores, never the registries

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{DaemonConfig, ZoneConfig};
use crate::health::{CheckerError, Scheduler};
use crate::lifecycle::Shutdown;
use crate::store::{MemoryStore, SharedStore};
use crate::upstream::StaticRegistry;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to spawn checker #{index} on worker {worker}: {source}")]
    Checker {
        index: usize,
        worker: usize,
        #[source]
        source: CheckerError,
    },
}

/// One cooperating worker.
#[derive(Debug)]
pub struct Worker {
    pub scheduler: Scheduler,
    pub registry: Arc<StaticRegistry>,
}

/// A running set of workers.
#[derive(Debug)]
pub struct Daemon {
    workers: Vec<Worker>,
    stores: HashMap<String, Arc<dyn SharedStore>>,
}

impl Daemon {
    /// Build stores and workers and spawn every checker.
    pub async fn start(config: &DaemonConfig, shutdown: &Shutdown) -> Result<Self, StartupError> {
        let stores: HashMap<String, Arc<dyn SharedStore>> = config
            .stores
            .iter()
            .map(|store| (store.name.clone(), Arc::new(MemoryStore::new()) as Arc<dyn SharedStore>))
            .collect();

        let mut workers = Vec::with_capacity(config.workers);
        for worker in 0..config.workers {
            let registry = Arc::new(StaticRegistry::new(&config.zones));
            let scheduler = Scheduler::new(worker, stores.clone(), registry.clone(), shutdown.clone());

            for (index, options) in config.checkers.iter().enumerate() {
                scheduler
                    .spawn_checker(options)
                    .await
                    .map_err(|source| StartupError::Checker { index, worker, source })?;
            }
            workers.push(Worker { scheduler, registry });
        }

        tracing::info!(
            workers = workers.len(),
            stores = stores.len(),
            checkers = config.checkers.len(),
            "Health checkers started"
        );

        Ok(Self { workers, stores })
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn store(&self, name: &str) -> Option<&Arc<dyn SharedStore>> {
        self.stores.get(name)
    }

    /// Swap new zone membership into every worker's registry.
    pub fn reload_zones(&self, zones: &[ZoneConfig]) {
        for worker in &self.workers {
            worker.registry.replace_zones(zones);
        }
    }
}
