//! Worker group configuration

use serde::{Deserialize, Serialize};

/// A named partition of workers that share one routing target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Unique group name (e.g. "cluster1")
    pub name: String,
    /// Identifier of the load balancer routing target this group feeds
    pub routing_target: String,
    /// Optional glob matched against worker ids in http discovery mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_pattern: Option<String>,
    /// Static members, used when discovery.mode = "static"
    #[serde(default)]
    pub workers: Vec<WorkerConfig>,
}

impl GroupConfig {
    pub fn new(name: impl Into<String>, routing_target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routing_target: routing_target.into(),
            member_pattern: None,
            workers: Vec::new(),
        }
    }
}

/// A statically configured worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Stable identifier; generated at startup when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Base URL of the worker endpoint
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_config_parse() {
        let toml = r#"
        name = "cluster1"
        routing_target = "rt-cluster1"

        [[workers]]
        address = "http://10.0.0.1:8000"
        "#;
        let group: GroupConfig = toml::from_str(toml).unwrap();
        assert_eq!(group.name, "cluster1");
        assert_eq!(group.workers.len(), 1);
        assert!(group.workers[0].id.is_none());
    }

    #[test]
    fn test_group_config_new() {
        let group = GroupConfig::new("cluster1", "rt-1");
        assert_eq!(group.name, "cluster1");
        assert_eq!(group.routing_target, "rt-1");
        assert!(group.workers.is_empty());
    }
}
