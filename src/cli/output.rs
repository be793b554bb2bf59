//! Output formatting helpers for CLI commands

use crate::fleet::WorkerView;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// One row of a probe or status table: a worker plus its standing in the group.
#[derive(Debug, Clone, serde::Serialize)]
pub struct WorkerRow {
    pub group: String,
    pub id: String,
    pub address: String,
    pub score: Option<f64>,
    pub error: Option<String>,
    pub winner: bool,
}

impl WorkerRow {
    pub fn from_view(view: &WorkerView, winner: Option<&str>) -> Self {
        Self {
            group: view.group.clone(),
            id: view.id.clone(),
            address: view.address.clone(),
            score: view.score,
            error: view.error.clone(),
            winner: Some(view.id.as_str()) == winner,
        }
    }
}

/// Format worker rows as a table
pub fn format_workers_table(rows: &[WorkerRow]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Group", "Worker", "Address", "Score", "State"]);

    for row in rows {
        let score = match row.score {
            Some(score) => format!("{:.4}", score),
            None => "-".to_string(),
        };
        let state = match (&row.error, row.winner) {
            (Some(error), _) => format!("failed: {}", error).red().to_string(),
            (None, true) => "winner".green().to_string(),
            (None, false) if row.score.is_some() => "ok".normal().to_string(),
            (None, false) => "unprobed".yellow().to_string(),
        };

        table.add_row(vec![
            Cell::new(&row.group),
            Cell::new(&row.id),
            Cell::new(&row.address),
            Cell::new(score),
            Cell::new(state),
        ]);
    }

    table.to_string()
}

/// Format worker rows as JSON
pub fn format_workers_json(rows: &[WorkerRow]) -> String {
    serde_json::to_string_pretty(&json!({
        "workers": rows
    }))
    .unwrap()
}

/// Format duration in a human-readable way
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, score: Option<f64>, winner: bool) -> WorkerRow {
        WorkerRow {
            group: "cluster1".to_string(),
            id: id.to_string(),
            address: format!("http://10.0.0.1:8000/{}", id),
            score,
            error: None,
            winner,
        }
    }

    #[test]
    fn test_format_workers_table_empty() {
        let output = format_workers_table(&[]);
        assert!(output.contains("Group")); // Header present
    }

    #[test]
    fn test_format_workers_table_with_data() {
        let rows = vec![row("w1", Some(0.12), false), row("w2", Some(0.08), true)];
        let output = format_workers_table(&rows);
        assert!(output.contains("w1"));
        assert!(output.contains("0.0800"));
        assert!(output.contains("winner"));
    }

    #[test]
    fn test_format_workers_table_failed_worker() {
        let mut failed = row("w3", None, false);
        failed.error = Some("connection failed: refused".to_string());
        let output = format_workers_table(&[failed]);
        assert!(output.contains("failed"));
    }

    #[test]
    fn test_format_workers_json_valid() {
        let rows = vec![row("w1", Some(0.12), true)];
        let output = format_workers_json(&rows);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["workers"][0]["id"], "w1");
        assert_eq!(parsed["workers"][0]["winner"], true);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30), "30s");
        assert_eq!(format_duration(90), "1m 30s");
        assert_eq!(format_duration(3661), "1h 1m 1s");
    }
}
