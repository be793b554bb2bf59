//! Fleet module.
//!
//! Thread-safe in-memory snapshot of worker group membership. The fleet is
//! refreshed from the discovery collaborator at the start of every cycle:
//! workers that vanish from the discovery result are dropped, not marked
//! failed, so membership shrinkage never pollutes ranking.

mod worker;

pub use worker::*;

use crate::probe::{ProbeRecord, ProbeResult};
use crate::providers::DiscoveredWorker;
use chrono::Utc;
use dashmap::DashMap;

/// Current worker membership plus each worker's most recent probe.
///
/// Backed by a lock-free concurrent map so the control loop can write while
/// the operational API reads.
pub struct Fleet {
    workers: DashMap<String, Worker>,
}

impl Fleet {
    /// Create a new empty Fleet.
    pub fn new() -> Self {
        Self {
            workers: DashMap::new(),
        }
    }

    /// Replace one group's membership with the latest discovery result.
    ///
    /// Existing workers keep their last probe; new workers start unprobed;
    /// workers absent from `discovered` are removed.
    pub fn apply_discovery(&self, group: &str, discovered: &[DiscoveredWorker]) {
        let present: std::collections::HashSet<&str> =
            discovered.iter().map(|w| w.id.as_str()).collect();

        let vanished: Vec<String> = self
            .workers
            .iter()
            .filter(|entry| entry.value().group == group && !present.contains(entry.key().as_str()))
            .map(|entry| entry.key().clone())
            .collect();
        for id in vanished {
            if self.workers.remove(&id).is_some() {
                tracing::debug!(worker_id = %id, group = %group, "Worker left discovery result");
            }
        }

        for d in discovered {
            match self.workers.get_mut(&d.id) {
                Some(mut entry) => {
                    entry.address = d.address.clone();
                    entry.group = group.to_string();
                    entry.last_seen = Utc::now();
                }
                None => {
                    self.workers.insert(
                        d.id.clone(),
                        Worker::new(d.id.clone(), d.address.clone(), group.to_string()),
                    );
                }
            }
        }
    }

    /// Record the outcome of a probe for a worker.
    ///
    /// A no-op when the worker has vanished since the probe was dispatched.
    pub fn record_probe(&self, worker_id: &str, result: ProbeResult) {
        if let Some(mut entry) = self.workers.get_mut(worker_id) {
            entry.last_probe = Some(ProbeRecord {
                result,
                checked_at: Utc::now(),
            });
        }
    }

    /// All workers currently in a group.
    pub fn workers_in_group(&self, group: &str) -> Vec<Worker> {
        let mut workers: Vec<Worker> = self
            .workers
            .iter()
            .filter(|entry| entry.value().group == group)
            .map(|entry| entry.value().clone())
            .collect();
        workers.sort_by(|a, b| a.id.cmp(&b.id));
        workers
    }

    /// Total number of workers across all groups.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Serializable snapshot of the whole fleet, ordered by group then id.
    pub fn snapshot(&self) -> Vec<WorkerView> {
        let mut views: Vec<WorkerView> = self
            .workers
            .iter()
            .map(|entry| WorkerView::from(entry.value()))
            .collect();
        views.sort_by(|a, b| (a.group.as_str(), a.id.as_str()).cmp(&(b.group.as_str(), b.id.as_str())));
        views
    }
}

impl Default for Fleet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeError;

    fn discovered(id: &str, address: &str) -> DiscoveredWorker {
        DiscoveredWorker {
            id: id.to_string(),
            address: address.to_string(),
        }
    }

    #[test]
    fn test_apply_discovery_adds_workers() {
        let fleet = Fleet::new();
        fleet.apply_discovery(
            "cluster1",
            &[
                discovered("w1", "http://10.0.0.1:8000"),
                discovered("w2", "http://10.0.0.2:8000"),
            ],
        );

        assert_eq!(fleet.worker_count(), 2);
        let workers = fleet.workers_in_group("cluster1");
        assert_eq!(workers.len(), 2);
        assert_eq!(workers[0].id, "w1");
    }

    #[test]
    fn test_apply_discovery_removes_vanished_workers() {
        let fleet = Fleet::new();
        fleet.apply_discovery(
            "cluster1",
            &[
                discovered("w1", "http://10.0.0.1:8000"),
                discovered("w2", "http://10.0.0.2:8000"),
            ],
        );

        fleet.apply_discovery("cluster1", &[discovered("w1", "http://10.0.0.1:8000")]);

        assert_eq!(fleet.worker_count(), 1);
        assert_eq!(fleet.workers_in_group("cluster1")[0].id, "w1");
    }

    #[test]
    fn test_apply_discovery_only_touches_named_group() {
        let fleet = Fleet::new();
        fleet.apply_discovery("cluster1", &[discovered("w1", "http://10.0.0.1:8000")]);
        fleet.apply_discovery("cluster2", &[discovered("x1", "http://10.0.1.1:8000")]);

        // Emptying cluster2 must not disturb cluster1.
        fleet.apply_discovery("cluster2", &[]);

        assert_eq!(fleet.workers_in_group("cluster1").len(), 1);
        assert!(fleet.workers_in_group("cluster2").is_empty());
    }

    #[test]
    fn test_apply_discovery_preserves_last_probe() {
        let fleet = Fleet::new();
        fleet.apply_discovery("cluster1", &[discovered("w1", "http://10.0.0.1:8000")]);
        fleet.record_probe(
            "w1",
            ProbeResult::Success {
                score: 0.12,
                latency_ms: 120,
            },
        );

        fleet.apply_discovery("cluster1", &[discovered("w1", "http://10.0.0.9:8000")]);

        let worker = &fleet.workers_in_group("cluster1")[0];
        assert_eq!(worker.address, "http://10.0.0.9:8000");
        assert!(worker.last_probe.is_some());
    }

    #[test]
    fn test_record_probe_for_unknown_worker_is_noop() {
        let fleet = Fleet::new();
        fleet.record_probe(
            "ghost",
            ProbeResult::Failure {
                error: ProbeError::ConnectionFailed("refused".to_string()),
            },
        );
        assert_eq!(fleet.worker_count(), 0);
    }

    #[test]
    fn test_snapshot_sorted_and_flattened() {
        let fleet = Fleet::new();
        fleet.apply_discovery("cluster2", &[discovered("x1", "http://10.0.1.1:8000")]);
        fleet.apply_discovery(
            "cluster1",
            &[
                discovered("w2", "http://10.0.0.2:8000"),
                discovered("w1", "http://10.0.0.1:8000"),
            ],
        );

        let snapshot = fleet.snapshot();
        let ids: Vec<&str> = snapshot.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["w1", "w2", "x1"]);
    }

    #[test]
    fn test_worker_view_from_failed_probe() {
        let fleet = Fleet::new();
        fleet.apply_discovery("cluster1", &[discovered("w1", "http://10.0.0.1:8000")]);
        fleet.record_probe(
            "w1",
            ProbeResult::Failure {
                error: ProbeError::Timeout(2000),
            },
        );

        let view = &fleet.snapshot()[0];
        assert!(view.score.is_none());
        assert!(view.error.as_deref().unwrap().contains("timeout"));
        assert!(view.checked_at.is_some());
    }
}
