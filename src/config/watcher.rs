//! Configuration file watcher for zone membership reload.
//!
//! Only `[[zones]]` is live-reloadable. Workers apply each update to their
//! registries and checkers see it at their next peer-list refresh; store,
//! worker and checker changes need a restart.

use std::path::{Path, PathBuf};
use std::time::Duration;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::ZoneConfig;

/// A watcher that turns config file edits into zone membership updates.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<Vec<ZoneConfig>>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for zone updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<Vec<ZoneConfig>>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (Self { path: path.to_path_buf(), update_tx }, update_rx)
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    tracing::info!(path = ?path, "Config file change detected, reloading zones");
                    match reload_zones(&path) {
                        Ok(zones) => {
                            if tx.send(zones).is_err() {
                                tracing::debug!("Zone update receiver gone, dropping reload");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config, keeping current zones");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Load and validate the file, keeping only the reloadable part.
pub fn reload_zones(path: &Path) -> Result<Vec<ZoneConfig>, ConfigError> {
    load_config(path).map(|config| config.zones)
}
