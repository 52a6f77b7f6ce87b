//! Metrics collection.
//!
//! # Metrics
//! - `hotconf_rebuilds_total` (counter): merged tree rebuilds
//! - `hotconf_rebuild_duration_seconds` (histogram): time spent folding sources
//! - `hotconf_sources` (gauge): registered sources
//! - `hotconf_reload_errors_total` (counter): failed source reloads, by source
//! - `hotconf_observer_notifications_total` (counter): observer callbacks fired
//! - `hotconf_trigger_fires_total` (counter): trigger firings, by kind
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Exposition is the binary's concern (Prometheus exporter)

use std::net::SocketAddr;
use std::time::Duration;

pub fn record_rebuild(duration: Duration) {
    ::metrics::counter!("hotconf_rebuilds_total").increment(1);
    ::metrics::histogram!("hotconf_rebuild_duration_seconds").record(duration.as_secs_f64());
}

pub fn record_sources(count: usize) {
    ::metrics::gauge!("hotconf_sources").set(count as f64);
}

pub fn record_reload_error(source_id: &str) {
    ::metrics::counter!("hotconf_reload_errors_total", "source" => source_id.to_string())
        .increment(1);
}

pub fn record_observer_notifications(count: usize) {
    ::metrics::counter!("hotconf_observer_notifications_total").increment(count as u64);
}

pub fn record_trigger_fire(kind: &'static str) {
    ::metrics::counter!("hotconf_trigger_fires_total", "kind" => kind).increment(1);
}

/// Install the Prometheus exporter, serving scrapes on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}
