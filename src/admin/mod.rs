//! Admin API.
//!
//! # Routes
//! - `GET /status`: text status page of every zone
//! - `GET /status/{zone}`: `up` (200) or `down` (503)
//! - `GET /status/{zone}/peers`: JSON peer listing
//!
//! Every route requires `Authorization: Bearer <api_key>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;
use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::health::ActiveCheckers;
use crate::lifecycle::Shutdown;
use crate::upstream::UpstreamRegistry;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// What the admin handlers read: one worker's registry and checker counts.
#[derive(Debug, Clone)]
pub struct AdminState {
    pub registry: Arc<dyn UpstreamRegistry>,
    pub active: Arc<ActiveCheckers>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(
        registry: Arc<dyn UpstreamRegistry>,
        active: Arc<ActiveCheckers>,
        api_key: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            registry,
            active,
            api_key: api_key.into(),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/status/{zone}", get(get_zone_status))
        .route("/status/{zone}/peers", get(get_zone_peers))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the admin API until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    shutdown: &Shutdown,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin API listening");

    let mut rx = shutdown.subscribe();
    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = rx.recv().await;
        })
        .await?;

    tracing::info!("Admin API stopped");
    Ok(())
}
