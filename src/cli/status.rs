//! Status command implementation
//!
//! Queries a running daemon's `/v1/status` endpoint and renders it.

use crate::cli::output::{format_duration, format_workers_table, WorkerRow};
use crate::cli::StatusArgs;
use crate::ops::StatusResponse;
use anyhow::Context;
use colored::Colorize;
use std::collections::HashMap;
use std::fmt::Write;
use std::time::Duration;

/// Handle status command
pub async fn handle_status(args: &StatusArgs) -> anyhow::Result<String> {
    let url = format!("{}/v1/status", args.endpoint.trim_end_matches('/'));
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("Failed to build HTTP client");

    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("failed to reach {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("{} returned HTTP {}", url, response.status().as_u16());
    }

    let status: StatusResponse = response
        .json()
        .await
        .context("failed to parse status response")?;

    if args.json {
        Ok(serde_json::to_string_pretty(&status)?)
    } else {
        Ok(format_status_pretty(&status))
    }
}

fn format_status_pretty(status: &StatusResponse) -> String {
    let mut output = String::new();

    writeln!(output, "Version: {}", status.version).unwrap();
    writeln!(output, "Uptime: {}", format_duration(status.uptime_seconds)).unwrap();
    writeln!(output, "Phase: {}", status.phase).unwrap();

    // Winner per group from the newest cycle report.
    let mut winners: HashMap<&str, &str> = HashMap::new();
    if let Some(latest) = status.cycles.first() {
        writeln!(output).unwrap();
        if let Some(reason) = &latest.skipped {
            writeln!(
                output,
                "Cycle {}: {}",
                latest.cycle,
                format!("skipped ({})", reason).yellow()
            )
            .unwrap();
        } else {
            writeln!(output, "Cycle {}:", latest.cycle).unwrap();
            for outcome in &latest.outcomes {
                let winner = outcome.winner.as_deref().unwrap_or("none");
                if let Some(w) = &outcome.winner {
                    winners.insert(outcome.group.as_str(), w.as_str());
                }
                let line = format!(
                    "  {} -> {} ({} mutations, {} errors)",
                    outcome.group,
                    winner,
                    outcome.mutations_applied(),
                    outcome.errors.len()
                );
                if outcome.errors.is_empty() {
                    writeln!(output, "{}", line).unwrap();
                } else {
                    writeln!(output, "{}", line.red()).unwrap();
                }
            }
        }
    }

    if !status.workers.is_empty() {
        let rows: Vec<WorkerRow> = status
            .workers
            .iter()
            .map(|view| WorkerRow::from_view(view, winners.get(view.group.as_str()).copied()))
            .collect();
        writeln!(output).unwrap();
        write!(output, "{}", format_workers_table(&rows)).unwrap();
    }

    output
}
