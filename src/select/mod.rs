//! Winner selection.
//!
//! Given one group's probe results, picks the single worker the group's
//! routing target should converge to. Failure-marked results are excluded
//! before ranking; an empty remainder yields no decision rather than a
//! default worker, and the convergence engine leaves routing untouched.

use crate::probe::ProbeResult;
use serde::{Deserialize, Serialize};

/// The chosen worker for one group, and the score that justified it.
///
/// Ephemeral: produced once per cycle and consumed by the convergence engine
/// of the same cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionDecision {
    pub group: String,
    pub winner: String,
    pub score: f64,
}

/// Select the best worker from one group's probe results.
///
/// Ranks by fitness score ascending (lower is better). Exact score ties
/// break on the lexicographically smallest worker id, so the order is total
/// and repeated calls with identical input pick the same winner.
///
/// Returns `None` when no worker in the group was probed successfully.
pub fn select_winner(
    group: &str,
    results: &[(String, ProbeResult)],
) -> Option<SelectionDecision> {
    results
        .iter()
        .filter_map(|(id, result)| result.score().map(|score| (id, score)))
        .min_by(|(a_id, a_score), (b_id, b_score)| {
            a_score.total_cmp(b_score).then_with(|| a_id.cmp(b_id))
        })
        .map(|(id, score)| SelectionDecision {
            group: group.to_string(),
            winner: id.clone(),
            score,
        })
}
