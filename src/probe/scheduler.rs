//! Probe fan-out for one cycle.

use super::{Probe, ProbeError, ProbeResult};
use crate::config::ProbeConfig;
use crate::fleet::Worker;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fans probes out across every worker in every group once per cycle.
///
/// Fan-out is bounded: at most `concurrency` probes are in flight at once,
/// because worker endpoints and metric APIs both have connection limits.
/// Individual failures never cancel sibling probes; a worker whose probe
/// still fails after the configured retries is reported with a failure
/// marker rather than omitted, so downstream stages can tell "probed and
/// failed" apart from "not in this group".
pub struct ProbeScheduler {
    prober: Arc<dyn Probe>,
    config: ProbeConfig,
}

impl ProbeScheduler {
    pub fn new(prober: Arc<dyn Probe>, config: ProbeConfig) -> Self {
        Self { prober, config }
    }

    /// Probe every worker in `groups` exactly once.
    ///
    /// Returns results keyed by group name. Groups are present in the result
    /// even when empty.
    pub async fn run_cycle(
        &self,
        groups: &[(String, Vec<Worker>)],
        cancel: &CancellationToken,
    ) -> HashMap<String, Vec<(String, ProbeResult)>> {
        let mut results: HashMap<String, Vec<(String, ProbeResult)>> = groups
            .iter()
            .map(|(name, _)| (name.clone(), Vec::new()))
            .collect();

        let tasks: Vec<(String, Worker)> = groups
            .iter()
            .flat_map(|(name, workers)| workers.iter().map(|w| (name.clone(), w.clone())))
            .collect();

        let attempts = self.config.retries + 1;
        let probed: Vec<(String, String, ProbeResult)> = stream::iter(tasks)
            .map(|(group, worker)| {
                let prober = Arc::clone(&self.prober);
                let cancel = cancel.clone();
                async move {
                    let result = probe_with_retry(prober.as_ref(), &worker, attempts, &cancel).await;
                    (group, worker.id, result)
                }
            })
            .buffer_unordered(self.config.concurrency.max(1) as usize)
            .collect()
            .await;

        for (group, worker_id, result) in probed {
            if let ProbeResult::Failure { error } = &result {
                tracing::debug!(
                    group = %group,
                    worker_id = %worker_id,
                    error = %error,
                    "Probe failed"
                );
            }
            if let Some(entries) = results.get_mut(&group) {
                entries.push((worker_id, result));
            }
        }

        results
    }
}

/// Probe one worker, retrying failed attempts within the cycle.
async fn probe_with_retry(
    prober: &dyn Probe,
    worker: &Worker,
    attempts: u32,
    cancel: &CancellationToken,
) -> ProbeResult {
    let mut last = ProbeResult::Failure {
        error: ProbeError::Cancelled,
    };

    for attempt in 1..=attempts.max(1) {
        if cancel.is_cancelled() {
            return ProbeResult::Failure {
                error: ProbeError::Cancelled,
            };
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                return ProbeResult::Failure { error: ProbeError::Cancelled };
            }
            result = prober.probe(worker) => result,
        };

        if result.is_success() {
            return result;
        }

        tracing::trace!(
            worker_id = %worker.id,
            attempt = attempt,
            "Probe attempt failed"
        );
        last = result;
    }

    last
}
