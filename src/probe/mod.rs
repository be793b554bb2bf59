//! Worker probing.
//!
//! A probe is one round-trip health measurement against one worker, producing
//! a scalar fitness score (lower is better) or an explicit failure marker.
//! The metric behind the score is a configuration choice: round-trip latency
//! or reported CPU utilization.

mod error;
mod scheduler;

pub use error::*;
pub use scheduler::*;

use crate::config::{MetricSource, ProbeConfig};
use crate::fleet::Worker;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Outcome of one probe.
///
/// A failure carries no usable score and must be excluded from ranking
/// explicitly; it is never coerced to zero or infinity.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeResult {
    /// Worker responded; `score` is the fitness value to rank by
    Success { score: f64, latency_ms: u32 },
    /// Worker unreachable, slow, or erroring
    Failure { error: ProbeError },
}

impl ProbeResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeResult::Success { .. })
    }

    /// The fitness score, if the probe succeeded.
    pub fn score(&self) -> Option<f64> {
        match self {
            ProbeResult::Success { score, .. } => Some(*score),
            ProbeResult::Failure { .. } => None,
        }
    }
}

/// A probe result together with when it completed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRecord {
    pub result: ProbeResult,
    pub checked_at: DateTime<Utc>,
}

/// One round-trip health measurement against one worker.
///
/// Implementations must never block past their configured timeout and never
/// propagate an error to the caller; every failure mode maps to a
/// failure-marked [`ProbeResult`].
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, worker: &Worker) -> ProbeResult;
}

/// HTTP prober with connection pooling.
pub struct HttpProber {
    client: reqwest::Client,
    config: ProbeConfig,
}

impl HttpProber {
    /// Create a new prober with a default HTTP client.
    pub fn new(config: ProbeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .expect("Failed to build HTTP client");

        Self { client, config }
    }

    /// Create a prober with a custom HTTP client (for testing).
    pub fn with_client(config: ProbeConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    async fn probe_latency(&self, worker: &Worker) -> ProbeResult {
        let url = join_path(&worker.address, &self.config.probe_path);
        let start = Instant::now();

        match self.client.get(&url).send().await {
            Ok(response) => {
                let elapsed = start.elapsed();
                if !response.status().is_success() {
                    return ProbeResult::Failure {
                        error: ProbeError::HttpStatus(response.status().as_u16()),
                    };
                }
                ProbeResult::Success {
                    score: elapsed.as_secs_f64(),
                    latency_ms: elapsed.as_millis() as u32,
                }
            }
            Err(e) => ProbeResult::Failure {
                error: self.classify_error(e),
            },
        }
    }

    async fn probe_utilization(&self, worker: &Worker) -> ProbeResult {
        let url = join_path(&worker.address, &self.config.stats_path);
        let start = Instant::now();

        match self.client.get(&url).send().await {
            Ok(response) => {
                let latency_ms = start.elapsed().as_millis() as u32;
                if !response.status().is_success() {
                    return ProbeResult::Failure {
                        error: ProbeError::HttpStatus(response.status().as_u16()),
                    };
                }
                match response.text().await {
                    Ok(body) => match parse_utilization(&body) {
                        Ok(pct) => ProbeResult::Success {
                            score: pct,
                            latency_ms,
                        },
                        Err(error) => ProbeResult::Failure { error },
                    },
                    Err(e) => ProbeResult::Failure {
                        error: ProbeError::InvalidPayload(e.to_string()),
                    },
                }
            }
            Err(e) => ProbeResult::Failure {
                error: self.classify_error(e),
            },
        }
    }

    fn classify_error(&self, e: reqwest::Error) -> ProbeError {
        if e.is_timeout() {
            ProbeError::Timeout(self.config.timeout_ms)
        } else {
            // All other transport errors treated as connection failures
            ProbeError::ConnectionFailed(e.to_string())
        }
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn probe(&self, worker: &Worker) -> ProbeResult {
        match self.config.metric {
            MetricSource::Latency => self.probe_latency(worker).await,
            MetricSource::Utilization => self.probe_utilization(worker).await,
        }
    }
}

/// Parse a worker stats payload into a utilization percentage.
///
/// Expected shape: `{"cpu_percent": 42.5}`.
fn parse_utilization(body: &str) -> Result<f64, ProbeError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ProbeError::InvalidPayload(e.to_string()))?;

    value
        .get("cpu_percent")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| ProbeError::InvalidPayload("missing numeric cpu_percent field".to_string()))
}

fn join_path(address: &str, path: &str) -> String {
    format!("{}{}", address.trim_end_matches('/'), path)
}
