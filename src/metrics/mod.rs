//! Prometheus metrics for the collector
//!
//! This module tracks API requests, quota spend, accepted and discarded
//! records, and checkpoint writes. A collection run is a batch job, so the
//! registry is written once as a Prometheus textfile at the end of the run.
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter, register_counter_vec, Counter, CounterVec, Encoder, TextEncoder,
};
use std::path::Path;
use std::sync::OnceLock;

/// Container for all collector metrics
struct CollectorMetrics {
    api_requests: CounterVec,
    quota_units: Counter,
    records_accepted: CounterVec,
    records_discarded: Counter,
    checkpoint_writes: Counter,
}

/// Global storage for collector metrics, `None` when registration failed
static COLLECTOR_METRICS: OnceLock<Option<CollectorMetrics>> = OnceLock::new();

/// Initialize all Prometheus metrics
///
/// This function should be called once at application startup.
/// If metric registration fails, subsequent metric operations become no-ops.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let mut failure = None;
    COLLECTOR_METRICS.get_or_init(|| match register_metrics() {
        Ok(metrics) => Some(metrics),
        Err(e) => {
            failure = Some(e);
            None
        }
    });
    failure.map_or(Ok(()), Err)
}

fn register_metrics() -> Result<CollectorMetrics, prometheus::Error> {
    Ok(CollectorMetrics {
        api_requests: register_counter_vec!(
            "strata_api_requests_total",
            "Platform API requests by endpoint and outcome",
            &["endpoint", "outcome"]
        )?,
        quota_units: register_counter!(
            "strata_quota_units_spent_total",
            "Quota units debited by this process"
        )?,
        records_accepted: register_counter_vec!(
            "strata_records_accepted_total",
            "Records accepted into a tier",
            &["tier"]
        )?,
        records_discarded: register_counter!(
            "strata_records_discarded_total",
            "Raw records dropped by the short-form filter"
        )?,
        checkpoint_writes: register_counter!(
            "strata_checkpoint_writes_total",
            "Collection checkpoints persisted"
        )?,
    })
}

fn metrics() -> Option<&'static CollectorMetrics> {
    COLLECTOR_METRICS.get().and_then(Option::as_ref)
}

/// Record one request attempt (`outcome` is `success`, `error` or `rejected`)
pub fn record_api_request(endpoint: &str, outcome: &str) {
    if let Some(m) = metrics() {
        m.api_requests.with_label_values(&[endpoint, outcome]).inc();
    }
}

/// Record quota units debited
pub fn record_quota_spent(units: u64) {
    if let Some(m) = metrics() {
        m.quota_units.inc_by(units as f64);
    }
}

/// Record records accepted into a tier
pub fn record_accepted(tier: &str, count: usize) {
    if let Some(m) = metrics() {
        m.records_accepted
            .with_label_values(&[tier])
            .inc_by(count as f64);
    }
}

/// Record raw records dropped by the extractor
pub fn record_discarded(count: usize) {
    if let Some(m) = metrics() {
        m.records_discarded.inc_by(count as f64);
    }
}

/// Record a checkpoint write
pub fn record_checkpoint_write() {
    if let Some(m) = metrics() {
        m.checkpoint_writes.inc();
    }
}

/// Encode the default registry in Prometheus text format
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Write the registry to a textfile for node_exporter style collection
pub fn write_textfile(path: &Path) -> std::io::Result<()> {
    std::fs::write(path, gather_text())
}
