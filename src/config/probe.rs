//! Probing configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which scalar metric the prober measures.
///
/// The sign convention is the same for both: lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MetricSource {
    /// Round-trip latency of a timed GET; score is elapsed seconds.
    #[default]
    Latency,
    /// CPU utilization reported by the worker's stats endpoint; score is a percentage.
    Utilization,
}

impl FromStr for MetricSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "latency" => Ok(MetricSource::Latency),
            "utilization" => Ok(MetricSource::Utilization),
            _ => Err(format!("Unknown metric source: {}", s)),
        }
    }
}

impl std::fmt::Display for MetricSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricSource::Latency => write!(f, "latency"),
            MetricSource::Utilization => write!(f, "utilization"),
        }
    }
}

/// Configuration for the probe cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Fitness metric to rank workers by
    pub metric: MetricSource,
    /// Seconds between probe cycles
    pub interval_seconds: u64,
    /// Timeout for each individual probe
    pub timeout_ms: u64,
    /// Maximum probes in flight at once
    pub concurrency: u32,
    /// In-cycle retries per worker after a failed probe
    pub retries: u32,
    /// Path probed in latency mode
    pub probe_path: String,
    /// Path queried in utilization mode
    pub stats_path: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            metric: MetricSource::Latency,
            interval_seconds: 5,
            timeout_ms: 2000,
            concurrency: 16,
            retries: 1,
            probe_path: "/".to_string(),
            stats_path: "/stats".to_string(),
        }
    }
}
