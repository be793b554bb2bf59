//! Convergence configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Order in which a convergence plan's mutations are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MutationOrdering {
    /// Deregister losers before registering the winner. Narrows the window
    /// where two workers receive traffic for a single-winner group.
    #[default]
    RemoveFirst,
    /// Register the winner before deregistering losers. Narrows the window
    /// where no worker receives traffic.
    AddFirst,
}

impl FromStr for MutationOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remove_first" => Ok(MutationOrdering::RemoveFirst),
            "add_first" => Ok(MutationOrdering::AddFirst),
            _ => Err(format!("Unknown mutation ordering: {}", s)),
        }
    }
}

/// Policy for registered targets that discovery does not know about
/// (e.g. manually added through the load balancer's own tooling).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnmanagedTargets {
    /// Converge each routing target to exactly the winner.
    #[default]
    Remove,
    /// Only deregister targets that appear in the discovery result.
    Preserve,
}

/// Configuration for the convergence engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergeConfig {
    /// Attempts per routing mutation before giving up on the group for this cycle
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles on each subsequent retry
    pub initial_backoff_ms: u64,
    /// Mutation ordering policy
    pub ordering: MutationOrdering,
    /// Policy for targets not present in the discovery result
    pub unmanaged_targets: UnmanagedTargets,
}

impl Default for ConvergeConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
            ordering: MutationOrdering::RemoveFirst,
            unmanaged_targets: UnmanagedTargets::Remove,
        }
    }
}
