//! Shared scripted collaborators for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use rudder::config::GroupConfig;
use rudder::fleet::Worker;
use rudder::probe::{Probe, ProbeError, ProbeResult};
use rudder::providers::{
    DiscoveredWorker, DiscoveryError, RouterError, TargetRouter, WorkerDiscovery,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

/// In-memory routing collaborator that records every call.
pub struct RecordingRouter {
    targets: Mutex<HashMap<String, HashSet<String>>>,
    /// Every call in order, e.g. `"register rt-1 w2"`
    ops: Mutex<Vec<String>>,
    read_calls: AtomicU32,
    register_calls: AtomicU32,
    deregister_calls: AtomicU32,
    /// Mutations left to fail with a transient error
    transient_failures: AtomicU32,
    /// Worker ids whose registration fails permanently
    permanent_failures: Mutex<HashSet<String>>,
    /// One-shot override for the next registered_targets read
    stale_read: Mutex<Option<HashSet<String>>>,
}

impl RecordingRouter {
    pub fn new() -> Self {
        Self {
            targets: Mutex::new(HashMap::new()),
            ops: Mutex::new(Vec::new()),
            read_calls: AtomicU32::new(0),
            register_calls: AtomicU32::new(0),
            deregister_calls: AtomicU32::new(0),
            transient_failures: AtomicU32::new(0),
            permanent_failures: Mutex::new(HashSet::new()),
            stale_read: Mutex::new(None),
        }
    }

    pub fn with_targets(self, routing_target: &str, ids: &[&str]) -> Self {
        self.targets.lock().unwrap().insert(
            routing_target.to_string(),
            ids.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    /// Make the next `n` mutation calls fail with a transient error.
    pub fn fail_transient(&self, n: u32) {
        self.transient_failures.store(n, Ordering::SeqCst);
    }

    /// Make every registration of `worker_id` fail permanently.
    pub fn fail_permanent(&self, worker_id: &str) {
        self.permanent_failures
            .lock()
            .unwrap()
            .insert(worker_id.to_string());
    }

    /// Serve `ids` for the next read instead of the real set.
    pub fn stale_read(&self, ids: &[&str]) {
        *self.stale_read.lock().unwrap() = Some(ids.iter().map(|s| s.to_string()).collect());
    }

    pub fn targets_for(&self, routing_target: &str) -> HashSet<String> {
        self.targets
            .lock()
            .unwrap()
            .get(routing_target)
            .cloned()
            .unwrap_or_default()
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    pub fn read_calls(&self) -> u32 {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn register_calls(&self) -> u32 {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn deregister_calls(&self) -> u32 {
        self.deregister_calls.load(Ordering::SeqCst)
    }

    pub fn mutation_calls(&self) -> u32 {
        self.register_calls() + self.deregister_calls()
    }

    fn take_transient_failure(&self) -> bool {
        self.transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for RecordingRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TargetRouter for RecordingRouter {
    async fn registered_targets(
        &self,
        routing_target: &str,
    ) -> Result<HashSet<String>, RouterError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.ops.lock().unwrap().push(format!("read {}", routing_target));

        if let Some(stale) = self.stale_read.lock().unwrap().take() {
            return Ok(stale);
        }
        Ok(self.targets_for(routing_target))
    }

    async fn register(&self, routing_target: &str, worker_id: &str) -> Result<(), RouterError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.ops
            .lock()
            .unwrap()
            .push(format!("register {} {}", routing_target, worker_id));

        if self.take_transient_failure() {
            return Err(RouterError::Transient("scripted failure".to_string()));
        }
        if self.permanent_failures.lock().unwrap().contains(worker_id) {
            return Err(RouterError::Permanent(format!(
                "unknown target id '{}'",
                worker_id
            )));
        }

        let mut targets = self.targets.lock().unwrap();
        let entry = targets.entry(routing_target.to_string()).or_default();
        if !entry.insert(worker_id.to_string()) {
            return Err(RouterError::AlreadySatisfied);
        }
        Ok(())
    }

    async fn deregister(&self, routing_target: &str, worker_id: &str) -> Result<(), RouterError> {
        self.deregister_calls.fetch_add(1, Ordering::SeqCst);
        self.ops
            .lock()
            .unwrap()
            .push(format!("deregister {} {}", routing_target, worker_id));

        if self.take_transient_failure() {
            return Err(RouterError::Transient("scripted failure".to_string()));
        }

        let mut targets = self.targets.lock().unwrap();
        let entry = targets.entry(routing_target.to_string()).or_default();
        if !entry.remove(worker_id) {
            return Err(RouterError::AlreadySatisfied);
        }
        Ok(())
    }
}

/// Scripted discovery collaborator.
pub struct MockDiscovery {
    members: Mutex<HashMap<String, Vec<DiscoveredWorker>>>,
    unavailable: AtomicBool,
}

impl MockDiscovery {
    pub fn new() -> Self {
        Self {
            members: Mutex::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn with_group(self, group: &str, ids: &[&str]) -> Self {
        self.set_group(group, ids);
        self
    }

    pub fn set_group(&self, group: &str, ids: &[&str]) {
        self.members.lock().unwrap().insert(
            group.to_string(),
            ids.iter()
                .map(|id| DiscoveredWorker {
                    id: id.to_string(),
                    address: format!("http://10.0.0.1:8000/{}", id),
                })
                .collect(),
        );
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl Default for MockDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkerDiscovery for MockDiscovery {
    async fn list_workers(
        &self,
        group: &GroupConfig,
    ) -> Result<Vec<DiscoveredWorker>, DiscoveryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DiscoveryError::Unavailable("scripted outage".to_string()));
        }
        Ok(self
            .members
            .lock()
            .unwrap()
            .get(&group.name)
            .cloned()
            .unwrap_or_default())
    }
}

/// Scripted prober: fixed score per worker id, anything else fails.
pub struct ScriptedProbe {
    scores: Mutex<HashMap<String, f64>>,
}

impl ScriptedProbe {
    pub fn new(scores: &[(&str, f64)]) -> Self {
        Self {
            scores: Mutex::new(
                scores
                    .iter()
                    .map(|(id, score)| (id.to_string(), *score))
                    .collect(),
            ),
        }
    }

    pub fn set_score(&self, worker_id: &str, score: f64) {
        self.scores
            .lock()
            .unwrap()
            .insert(worker_id.to_string(), score);
    }

    pub fn fail(&self, worker_id: &str) {
        self.scores.lock().unwrap().remove(worker_id);
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self, worker: &Worker) -> ProbeResult {
        match self.scores.lock().unwrap().get(&worker.id) {
            Some(score) => ProbeResult::Success {
                score: *score,
                latency_ms: (*score * 1000.0) as u32,
            },
            None => ProbeResult::Failure {
                error: ProbeError::ConnectionFailed("scripted refusal".to_string()),
            },
        }
    }
}
