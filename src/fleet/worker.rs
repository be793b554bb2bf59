use crate::probe::{ProbeRecord, ProbeResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single backend endpoint eligible to receive traffic.
///
/// Workers appear when discovery reports them and disappear when it stops;
/// the fleet holds them only for as long as they are visible.
#[derive(Debug, Clone)]
pub struct Worker {
    /// Opaque identifier, stable across cycles
    pub id: String,
    /// Base URL of the worker endpoint
    pub address: String,
    /// Name of the owning group
    pub group: String,
    /// Most recent probe, if any
    pub last_probe: Option<ProbeRecord>,
    /// When discovery last reported this worker
    pub last_seen: DateTime<Utc>,
}

impl Worker {
    pub fn new(id: String, address: String, group: String) -> Self {
        Self {
            id,
            address,
            group,
            last_probe: None,
            last_seen: Utc::now(),
        }
    }
}

/// Serializable view of a worker for the status API and CLI output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerView {
    pub id: String,
    pub group: String,
    pub address: String,
    /// Fitness score from the most recent successful probe (lower is better)
    pub score: Option<f64>,
    pub latency_ms: Option<u32>,
    pub error: Option<String>,
    pub checked_at: Option<DateTime<Utc>>,
    pub last_seen: DateTime<Utc>,
}

impl From<&Worker> for WorkerView {
    fn from(worker: &Worker) -> Self {
        let (score, latency_ms, error, checked_at) = match &worker.last_probe {
            Some(record) => match &record.result {
                ProbeResult::Success { score, latency_ms } => {
                    (Some(*score), Some(*latency_ms), None, Some(record.checked_at))
                }
                ProbeResult::Failure { error } => {
                    (None, None, Some(error.to_string()), Some(record.checked_at))
                }
            },
            None => (None, None, None, None),
        };

        Self {
            id: worker.id.clone(),
            group: worker.group.clone(),
            address: worker.address.clone(),
            score,
            latency_ms,
            error,
            checked_at,
            last_seen: worker.last_seen,
        }
    }
}
