//! Metrics collection and exposition.
//!
//! # Metrics
//! - `healthcheck_probes_total` (counter): probes by zone, result
//! - `healthcheck_peer_up` (gauge): 1=up, 0=down, per zone and peer
//! - `healthcheck_cycles_total` (counter): cycles by zone, role
//! - `healthcheck_zone_version` (gauge): last published or adopted version
//! - `healthcheck_active_checkers` (gauge): running checkers per zone
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until a
//!   recorder is installed
//! - The Prometheus exporter is opt-in via `observability.metrics_enabled`

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(zone: &str, success: bool) {
    let result = if success { "ok" } else { "fail" };
    counter!("healthcheck_probes_total", "zone" => zone.to_string(), "result" => result).increment(1);
}

pub fn record_peer_state(zone: &str, peer: &str, up: bool) {
    gauge!("healthcheck_peer_up", "zone" => zone.to_string(), "peer" => peer.to_string())
        .set(if up { 1.0 } else { 0.0 });
}

pub fn record_cycle(zone: &str, leader: bool) {
    let role = if leader { "leader" } else { "follower" };
    counter!("healthcheck_cycles_total", "zone" => zone.to_string(), "role" => role).increment(1);
}

pub fn record_version(zone: &str, version: i64) {
    gauge!("healthcheck_zone_version", "zone" => zone.to_string()).set(version as f64);
}

pub fn record_active_checkers(zone: &str, count: usize) {
    gauge!("healthcheck_active_checkers", "zone" => zone.to_string()).set(count as f64);
}
