//! Routing convergence.
//!
//! Takes each group's selection decision and steers the load balancer's
//! registered-target set toward it: read the live set fresh, diff against
//! the winner, apply the minimal mutations with bounded retries. A group
//! whose convergence fails is skipped for the cycle and repaired by the
//! next one; other groups are never affected.

mod plan;

pub use plan::*;

use crate::config::{ConvergeConfig, GroupConfig};
use crate::control::GroupOutcome;
use crate::providers::{RouterError, TargetRouter};
use crate::select::SelectionDecision;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Applies selection decisions to the routing collaborator.
pub struct ConvergenceEngine {
    router: Arc<dyn TargetRouter>,
    config: ConvergeConfig,
}

impl ConvergenceEngine {
    pub fn new(router: Arc<dyn TargetRouter>, config: ConvergeConfig) -> Self {
        Self { router, config }
    }

    /// Converge one group's routing target to its selection decision.
    ///
    /// `None` means no decision: the routing target is left exactly as it
    /// is, without even a read. `members` is the group's current discovery
    /// result, consulted by the unmanaged-target policy.
    pub async fn converge_group(
        &self,
        group: &GroupConfig,
        decision: Option<&SelectionDecision>,
        members: &HashSet<String>,
        cancel: &CancellationToken,
    ) -> GroupOutcome {
        let mut outcome = GroupOutcome::new(&group.name);

        let decision = match decision {
            Some(d) => d,
            None => {
                tracing::warn!(
                    group = %group.name,
                    "No viable worker this cycle, leaving routing untouched"
                );
                return outcome;
            }
        };
        outcome.winner = Some(decision.winner.clone());
        outcome.score = Some(decision.score);

        // The live set may have been touched by other actors since the last
        // cycle; it is re-read every time, never assumed from memory.
        let live = match self.read_live(&group.routing_target, cancel).await {
            Ok(live) => live,
            Err(e) => {
                tracing::error!(
                    group = %group.name,
                    routing_target = %group.routing_target,
                    error = %e,
                    "Failed to read registered targets, skipping group this cycle"
                );
                outcome.errors.push(e.to_string());
                return outcome;
            }
        };

        let plan = ConvergencePlan::build(
            &live,
            &decision.winner,
            members,
            self.config.unmanaged_targets,
        );
        if plan.is_empty() {
            tracing::debug!(
                group = %group.name,
                winner = %decision.winner,
                "Routing already converged"
            );
            return outcome;
        }

        for mutation in plan.ordered(self.config.ordering) {
            if cancel.is_cancelled() {
                outcome.errors.push("convergence interrupted by shutdown".to_string());
                break;
            }

            match self.apply_mutation(&group.routing_target, &mutation, cancel).await {
                Ok(applied) => {
                    if applied {
                        match &mutation {
                            Mutation::Register(id) => outcome.registered.push(id.clone()),
                            Mutation::Deregister(id) => outcome.deregistered.push(id.clone()),
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(
                        group = %group.name,
                        routing_target = %group.routing_target,
                        mutation = ?mutation,
                        error = %e,
                        "Routing mutation failed, skipping rest of group this cycle"
                    );
                    outcome.errors.push(e.to_string());
                    break;
                }
            }
        }

        outcome
    }

    async fn read_live(
        &self,
        routing_target: &str,
        cancel: &CancellationToken,
    ) -> Result<HashSet<String>, RouterError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.router.registered_targets(routing_target).await {
                Ok(live) => return Ok(live),
                Err(e) if e.is_transient() && attempt < self.config.max_attempts => {
                    self.backoff(attempt, cancel).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Apply one mutation with bounded retries.
    ///
    /// Returns whether a call actually changed the registered set; an
    /// already-satisfied mutation is absorbed as a successful no-op.
    async fn apply_mutation(
        &self,
        routing_target: &str,
        mutation: &Mutation,
        cancel: &CancellationToken,
    ) -> Result<bool, RouterError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match mutation {
                Mutation::Register(id) => self.router.register(routing_target, id).await,
                Mutation::Deregister(id) => self.router.deregister(routing_target, id).await,
            };

            match result {
                Ok(()) => return Ok(true),
                Err(RouterError::AlreadySatisfied) => {
                    tracing::debug!(
                        routing_target = %routing_target,
                        mutation = ?mutation,
                        "Mutation already satisfied"
                    );
                    return Ok(false);
                }
                Err(e) if e.is_transient() && attempt < self.config.max_attempts => {
                    tracing::debug!(
                        routing_target = %routing_target,
                        mutation = ?mutation,
                        attempt = attempt,
                        error = %e,
                        "Transient routing failure, retrying"
                    );
                    self.backoff(attempt, cancel).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Sleep before retry `attempt + 1`; doubles each time.
    async fn backoff(&self, attempt: u32, cancel: &CancellationToken) -> Result<(), RouterError> {
        let delay = Duration::from_millis(
            self.config.initial_backoff_ms.saturating_mul(1 << (attempt - 1).min(16)),
        );
        tokio::select! {
            _ = cancel.cancelled() => Err(RouterError::Transient(
                "cancelled while backing off".to_string(),
            )),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}
