//! Probe command implementation
//!
//! One-shot measurement pass: discover every group, probe every worker, rank,
//! and print what the control loop would have decided. Never touches routing.

use crate::cli::output::{format_workers_json, format_workers_table, WorkerRow};
use crate::cli::ProbeArgs;
use crate::config::RudderConfig;
use crate::fleet::Fleet;
use crate::probe::{HttpProber, Probe, ProbeScheduler};
use crate::select::select_winner;
use anyhow::{bail, Context};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Handle probe command
pub async fn handle_probe(args: &ProbeArgs) -> anyhow::Result<String> {
    let config = RudderConfig::load(Some(&args.config))
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    config.validate()?;

    let groups: Vec<_> = match &args.group {
        Some(name) => {
            let filtered: Vec<_> = config
                .groups
                .iter()
                .filter(|g| &g.name == name)
                .cloned()
                .collect();
            if filtered.is_empty() {
                bail!("no group named '{}' in {}", name, args.config.display());
            }
            filtered
        }
        None => config.groups.clone(),
    };

    let discovery = crate::cli::run::build_discovery(&config);
    let fleet = Fleet::new();
    for group in &groups {
        let discovered = discovery
            .list_workers(group)
            .await
            .with_context(|| format!("discovery failed for group '{}'", group.name))?;
        fleet.apply_discovery(&group.name, &discovered);
    }

    let prober: Arc<dyn Probe> = Arc::new(HttpProber::new(config.probe.clone()));
    let scheduler = ProbeScheduler::new(prober, config.probe.clone());

    let plan: Vec<_> = groups
        .iter()
        .map(|g| (g.name.clone(), fleet.workers_in_group(&g.name)))
        .collect();
    let results = scheduler.run_cycle(&plan, &CancellationToken::new()).await;

    for (_, entries) in results.iter() {
        for (worker_id, result) in entries {
            fleet.record_probe(worker_id, result.clone());
        }
    }

    let mut rows = Vec::new();
    for group in &groups {
        let entries = results
            .get(&group.name)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let decision = select_winner(&group.name, entries);
        let winner = decision.as_ref().map(|d| d.winner.as_str());

        for view in fleet.snapshot().iter().filter(|v| v.group == group.name) {
            rows.push(WorkerRow::from_view(view, winner));
        }
    }

    if args.json {
        Ok(format_workers_json(&rows))
    } else {
        Ok(format_workers_table(&rows))
    }
}
