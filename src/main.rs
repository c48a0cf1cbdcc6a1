use std::path::PathBuf;
use std::sync::Arc;
use clap::Parser;
use tokio::net::TcpListener;

use upstream_health::admin::{self, AdminState};
use upstream_health::config::loader::load_config;
use upstream_health::config::watcher::ConfigWatcher;
use upstream_health::lifecycle::{signals::shutdown_signal, Daemon, Shutdown};
use upstream_health::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "upstream-health")]
#[command(about = "Active health checker for upstream peers", long_about = None)]
struct Args {
    /// Path to the TOML config file.
    #[arg(short, long, default_value = "upstream-health.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_logging(&config.observability);
    tracing::info!("upstream-health v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        path = ?args.config,
        workers = config.workers,
        zones = config.zones.len(),
        checkers = config.checkers.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shutdown = Shutdown::new();
    let daemon = Arc::new(Daemon::start(&config, &shutdown).await?);

    // Keep the watcher alive until exit.
    let (watcher, mut zone_updates) = ConfigWatcher::new(&args.config);
    let _watcher = match watcher.run() {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::error!(error = %e, "Failed to watch config file, zone reload disabled");
            None
        }
    };
    let reloader = Arc::clone(&daemon);
    tokio::spawn(async move {
        while let Some(zones) = zone_updates.recv().await {
            reloader.reload_zones(&zones);
        }
    });

    let admin_task = match daemon.workers().first() {
        Some(worker) if config.admin.enabled => {
            let listener = TcpListener::bind(&config.admin.bind_address).await?;
            let state = AdminState::new(
                worker.scheduler.registry().clone(),
                worker.scheduler.active_checkers().clone(),
                config.admin.api_key.as_str(),
            );
            let shutdown = shutdown.clone();
            Some(tokio::spawn(async move {
                if let Err(e) = admin::serve(listener, state, &shutdown).await {
                    tracing::error!(error = %e, "Admin API failed");
                }
            }))
        }
        _ => None,
    };

    shutdown_signal().await;
    shutdown.trigger();

    if let Some(task) = admin_task {
        let _ = task.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
