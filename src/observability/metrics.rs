//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rtd_evaluations_total` (counter): routing decisions scored
//! - `rtd_candidates_scored_total` (counter): candidates scored
//! - `rtd_reloads_total` (counter): reloads by `outcome` (success, failure)
//! - `rtd_targets` / `rtd_rules` (gauge): size of the published rule set
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exposition is opt-in (`observability.metrics_enabled`)

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint. Requires a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_evaluation(candidates: usize) {
    counter!("rtd_evaluations_total").increment(1);
    counter!("rtd_candidates_scored_total").increment(candidates as u64);
}

pub fn record_reload(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("rtd_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_repository(targets: usize, rules: usize) {
    gauge!("rtd_targets").set(targets as f64);
    gauge!("rtd_rules").set(rules as f64);
}
