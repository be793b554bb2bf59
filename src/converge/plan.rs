//! Diff between the live registered set and the selected winner.

use crate::config::{MutationOrdering, UnmanagedTargets};
use std::collections::HashSet;

/// One routing mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Register(String),
    Deregister(String),
}

/// The minimal set of mutations that converges a routing target to its winner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergencePlan {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
    /// True when applying every removal would leave the live set empty
    drains_live: bool,
}

impl ConvergencePlan {
    /// Diff `live` against the winner.
    ///
    /// With [`UnmanagedTargets::Preserve`], targets absent from `members`
    /// (the discovery result for the group) are left alone.
    pub fn build(
        live: &HashSet<String>,
        winner: &str,
        members: &HashSet<String>,
        policy: UnmanagedTargets,
    ) -> Self {
        let mut to_remove: Vec<String> = live
            .iter()
            .filter(|id| id.as_str() != winner)
            .filter(|id| match policy {
                UnmanagedTargets::Remove => true,
                UnmanagedTargets::Preserve => members.contains(*id),
            })
            .cloned()
            .collect();
        to_remove.sort();

        let to_add = if live.contains(winner) {
            Vec::new()
        } else {
            vec![winner.to_string()]
        };

        let drains_live = !live.is_empty() && to_remove.len() == live.len();

        Self {
            to_add,
            to_remove,
            drains_live,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Mutations in application order.
    ///
    /// Remove-first ordering carries a guard: when the removals would empty
    /// the live set before the winner is registered, the registration moves
    /// to the front so the target set never passes through zero while a
    /// replacement is known.
    pub fn ordered(&self, ordering: MutationOrdering) -> Vec<Mutation> {
        let adds = self.to_add.iter().cloned().map(Mutation::Register);
        let removes = self.to_remove.iter().cloned().map(Mutation::Deregister);

        let add_first = match ordering {
            MutationOrdering::AddFirst => true,
            MutationOrdering::RemoveFirst => self.drains_live && !self.to_add.is_empty(),
        };

        if add_first {
            adds.chain(removes).collect()
        } else {
            removes.chain(adds).collect()
        }
    }
}
