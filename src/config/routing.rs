//! Routing collaborator configuration

use serde::{Deserialize, Serialize};

/// Load balancer admin API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Base URL of the admin API that owns the registered-target sets
    pub admin_url: String,
    pub timeout_ms: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            admin_url: "http://127.0.0.1:8404".to_string(),
            timeout_ms: 2000,
        }
    }
}
