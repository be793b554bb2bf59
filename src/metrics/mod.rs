//! # Metrics Collection Module
//!
//! Prometheus metrics for the steering loop, rendered at `GET /metrics`.
//!
//! **Counters:**
//! - `rudder_cycles_total` - Completed cycles (including skipped ones)
//! - `rudder_cycles_skipped_total` - Cycles skipped on discovery failure
//! - `rudder_probe_failures_total{group}` - Failed probes
//! - `rudder_mutations_total{group, kind}` - Applied routing mutations
//! - `rudder_group_errors_total{group}` - Group-level convergence errors
//! - `rudder_winner_changes_total{group}` - Winner handovers
//!
//! **Histograms:**
//! - `rudder_probe_latency_seconds{group}` - Probe round-trip time
//! - `rudder_cycle_duration_seconds` - Full cycle duration
//!
//! **Gauges:**
//! - `rudder_workers_known{group}` - Workers in the current discovery result

use crate::control::{CycleReport, GroupOutcome};
use crate::probe::ProbeResult;

pub use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder.
///
/// Must be called once at startup, before the control loop records anything.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(handle)
}

/// Record one probe result.
pub fn record_probe(group: &str, worker_id: &str, result: &ProbeResult) {
    match result {
        ProbeResult::Success { latency_ms, .. } => {
            metrics::histogram!("rudder_probe_latency_seconds",
                "group" => group.to_string()
            )
            .record(*latency_ms as f64 / 1000.0);
        }
        ProbeResult::Failure { error } => {
            tracing::trace!(
                group = %group,
                worker_id = %worker_id,
                error = %error,
                "Recording probe failure"
            );
            metrics::counter!("rudder_probe_failures_total",
                "group" => group.to_string()
            )
            .increment(1);
        }
    }
}

/// Record one group's convergence outcome.
pub fn record_group_outcome(outcome: &GroupOutcome) {
    if !outcome.registered.is_empty() {
        metrics::counter!("rudder_mutations_total",
            "group" => outcome.group.clone(),
            "kind" => "register"
        )
        .increment(outcome.registered.len() as u64);
    }
    if !outcome.deregistered.is_empty() {
        metrics::counter!("rudder_mutations_total",
            "group" => outcome.group.clone(),
            "kind" => "deregister"
        )
        .increment(outcome.deregistered.len() as u64);
    }
    if !outcome.errors.is_empty() {
        metrics::counter!("rudder_group_errors_total",
            "group" => outcome.group.clone()
        )
        .increment(outcome.errors.len() as u64);
    }
    if let (Some(winner), Some(previous)) = (&outcome.winner, &outcome.previous_winner) {
        if winner != previous {
            metrics::counter!("rudder_winner_changes_total",
                "group" => outcome.group.clone()
            )
            .increment(1);
        }
    }
}

/// Record a finished cycle.
pub fn record_cycle(report: &CycleReport) {
    metrics::counter!("rudder_cycles_total").increment(1);
    if report.skipped.is_some() {
        metrics::counter!("rudder_cycles_skipped_total").increment(1);
    }
    metrics::histogram!("rudder_cycle_duration_seconds")
        .record(report.duration_ms as f64 / 1000.0);
}

/// Update the per-group worker membership gauge.
pub fn set_workers_known(group: &str, count: usize) {
    metrics::gauge!("rudder_workers_known",
        "group" => group.to_string()
    )
    .set(count as f64);
}
