//! Cycle reporting types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::RwLock;

/// Where the control loop currently is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    #[default]
    Idle,
    Probing,
    Ranking,
    Converging,
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CyclePhase::Idle => write!(f, "idle"),
            CyclePhase::Probing => write!(f, "probing"),
            CyclePhase::Ranking => write!(f, "ranking"),
            CyclePhase::Converging => write!(f, "converging"),
        }
    }
}

/// What one cycle did to one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupOutcome {
    pub group: String,
    /// Selected worker, or None when no worker probed successfully
    pub winner: Option<String>,
    /// Fitness score behind the selection
    pub score: Option<f64>,
    /// Winner reported for this group in the previous cycle
    pub previous_winner: Option<String>,
    /// Workers registered this cycle
    pub registered: Vec<String>,
    /// Workers deregistered this cycle
    pub deregistered: Vec<String>,
    /// Group-level errors; the group self-heals next cycle
    pub errors: Vec<String>,
}

impl GroupOutcome {
    pub fn new(group: &str) -> Self {
        Self {
            group: group.to_string(),
            winner: None,
            score: None,
            previous_winner: None,
            registered: Vec::new(),
            deregistered: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Number of routing mutations actually applied.
    pub fn mutations_applied(&self) -> usize {
        self.registered.len() + self.deregistered.len()
    }
}

/// Summary of one full probe-rank-converge pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Monotonic cycle counter, starting at 1
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Reason the cycle was skipped before probing, if it was
    pub skipped: Option<String>,
    pub outcomes: Vec<GroupOutcome>,
}

/// Bounded in-memory history of recent cycle reports.
///
/// Owned by the control loop, read by the operational API. Old entries are
/// evicted once capacity is reached; the log never grows past one working
/// set.
pub struct CycleLog {
    entries: RwLock<VecDeque<CycleReport>>,
    capacity: usize,
}

impl CycleLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, report: CycleReport) {
        let mut entries = self.entries.write().expect("cycle log lock poisoned");
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(report);
    }

    /// Up to `n` most recent reports, newest first.
    pub fn recent(&self, n: usize) -> Vec<CycleReport> {
        let entries = self.entries.read().expect("cycle log lock poisoned");
        entries.iter().rev().take(n).cloned().collect()
    }

    pub fn latest(&self) -> Option<CycleReport> {
        let entries = self.entries.read().expect("cycle log lock poisoned");
        entries.back().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("cycle log lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CycleLog {
    fn default() -> Self {
        Self::new(64)
    }
}
