//! The control loop.
//!
//! Drives the probe-rank-converge cycle on a fixed period. One task runs
//! cycles strictly in sequence: a tick that fires while a cycle is still
//! converging is deferred, never raced, so two cycles can never issue
//! competing routing decisions. Cancellation stops the loop at the next
//! safe point; anything half-applied is repaired by the next run.

mod report;

pub use report::*;

use crate::config::GroupConfig;
use crate::converge::ConvergenceEngine;
use crate::fleet::Fleet;
use crate::probe::ProbeScheduler;
use crate::providers::WorkerDiscovery;
use crate::select::select_winner;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Background service that runs the steering cycle.
pub struct ControlLoop {
    fleet: Arc<Fleet>,
    discovery: Arc<dyn WorkerDiscovery>,
    scheduler: ProbeScheduler,
    engine: ConvergenceEngine,
    groups: Vec<GroupConfig>,
    interval: Duration,
    cycle_log: Arc<CycleLog>,
    phase: Arc<RwLock<CyclePhase>>,
    /// Last winner reported per group, for change detection in cycle events
    last_winners: HashMap<String, String>,
    cycles_run: u64,
}

impl ControlLoop {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fleet: Arc<Fleet>,
        discovery: Arc<dyn WorkerDiscovery>,
        scheduler: ProbeScheduler,
        engine: ConvergenceEngine,
        groups: Vec<GroupConfig>,
        interval: Duration,
        cycle_log: Arc<CycleLog>,
        phase: Arc<RwLock<CyclePhase>>,
    ) -> Self {
        Self {
            fleet,
            discovery,
            scheduler,
            engine,
            groups,
            interval,
            cycle_log,
            phase,
            last_winners: HashMap::new(),
            cycles_run: 0,
        }
    }

    /// Start the control loop background task.
    /// Returns a JoinHandle that resolves when the loop stops.
    pub fn start(mut self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            // Ticks missed while a cycle is in flight are dropped, deferring
            // the next cycle to the following tick.
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(
                interval_seconds = self.interval.as_secs(),
                groups = self.groups.len(),
                "Control loop started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Control loop shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let report = self.run_cycle(&cancel_token).await;
                        self.cycle_log.push(report);
                    }
                }
            }

            self.set_phase(CyclePhase::Idle);
        })
    }

    /// Run one full probe-rank-converge cycle.
    ///
    /// Public so tests and the one-shot CLI can drive cycles directly.
    pub async fn run_cycle(&mut self, cancel: &CancellationToken) -> CycleReport {
        self.cycles_run += 1;
        let cycle = self.cycles_run;
        let started_at = chrono::Utc::now();
        let start = Instant::now();

        tracing::debug!(cycle = cycle, "Cycle starting");
        self.set_phase(CyclePhase::Probing);

        // Membership refresh. A transiently unavailable inventory skips the
        // whole cycle; the previous routing state stands until the next tick.
        let mut memberships: Vec<(String, HashSet<String>)> = Vec::new();
        for group in &self.groups {
            match self.discovery.list_workers(group).await {
                Ok(discovered) => {
                    let ids: HashSet<String> =
                        discovered.iter().map(|w| w.id.clone()).collect();
                    self.fleet.apply_discovery(&group.name, &discovered);
                    crate::metrics::set_workers_known(&group.name, ids.len());
                    memberships.push((group.name.clone(), ids));
                }
                Err(e) => {
                    tracing::warn!(
                        cycle = cycle,
                        group = %group.name,
                        error = %e,
                        "Discovery unavailable, skipping cycle"
                    );
                    self.set_phase(CyclePhase::Idle);
                    let report = CycleReport {
                        cycle,
                        started_at,
                        duration_ms: start.elapsed().as_millis() as u64,
                        skipped: Some(e.to_string()),
                        outcomes: Vec::new(),
                    };
                    crate::metrics::record_cycle(&report);
                    return report;
                }
            }
        }

        let plan: Vec<(String, Vec<crate::fleet::Worker>)> = self
            .groups
            .iter()
            .map(|g| (g.name.clone(), self.fleet.workers_in_group(&g.name)))
            .collect();

        let probe_results = self.scheduler.run_cycle(&plan, cancel).await;
        for (group, entries) in &probe_results {
            for (worker_id, result) in entries {
                crate::metrics::record_probe(group, worker_id, result);
                self.fleet.record_probe(worker_id, result.clone());
            }
        }

        self.set_phase(CyclePhase::Ranking);
        let memberships: HashMap<String, HashSet<String>> = memberships.into_iter().collect();

        let mut outcomes = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            if cancel.is_cancelled() {
                tracing::info!(cycle = cycle, "Cycle abandoned mid-convergence");
                break;
            }

            let results = probe_results
                .get(&group.name)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let decision = select_winner(&group.name, results);

            self.set_phase(CyclePhase::Converging);
            let empty = HashSet::new();
            let members = memberships.get(&group.name).unwrap_or(&empty);
            let mut outcome = self
                .engine
                .converge_group(group, decision.as_ref(), members, cancel)
                .await;

            outcome.previous_winner = self.last_winners.get(&group.name).cloned();
            if let Some(winner) = &outcome.winner {
                if outcome.previous_winner.as_deref() != Some(winner.as_str()) {
                    tracing::info!(
                        group = %group.name,
                        winner = %winner,
                        previous = outcome.previous_winner.as_deref().unwrap_or("none"),
                        "Group winner changed"
                    );
                }
                self.last_winners.insert(group.name.clone(), winner.clone());
            }

            tracing::info!(
                cycle = cycle,
                group = %group.name,
                winner = outcome.winner.as_deref().unwrap_or("none"),
                previous_winner = outcome.previous_winner.as_deref().unwrap_or("none"),
                mutations = outcome.mutations_applied(),
                errors = outcome.errors.len(),
                "Cycle outcome"
            );
            crate::metrics::record_group_outcome(&outcome);
            outcomes.push(outcome);
        }

        self.set_phase(CyclePhase::Idle);
        let report = CycleReport {
            cycle,
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            skipped: None,
            outcomes,
        };
        crate::metrics::record_cycle(&report);
        report
    }

    fn set_phase(&self, phase: CyclePhase) {
        if let Ok(mut current) = self.phase.write() {
            *current = phase;
        }
    }
}
