//! Worker discovery configuration

use serde::{Deserialize, Serialize};

/// How worker group membership is discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    /// Members come from the `[[groups.workers]]` tables in the config file.
    #[default]
    Static,
    /// Members come from an HTTP inventory endpoint, refreshed every cycle.
    Http,
}

/// Worker discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub mode: DiscoveryMode,
    /// Inventory endpoint, required in http mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            mode: DiscoveryMode::Static,
            inventory_url: None,
            timeout_ms: 2000,
        }
    }
}
