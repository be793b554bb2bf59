//! Configuration module for Rudder
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`RUDDER_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use rudder::config::RudderConfig;
//!
//! // Load defaults
//! let config = RudderConfig::default();
//! assert_eq!(config.server.port, 9090);
//!
//! // Parse from TOML
//! let toml = r#"
//! [probe]
//! interval_seconds = 10
//! "#;
//! let config: RudderConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.probe.interval_seconds, 10);
//! ```

pub mod converge;
pub mod discovery;
pub mod error;
pub mod group;
pub mod logging;
pub mod probe;
pub mod routing;
pub mod server;

pub use converge::{ConvergeConfig, MutationOrdering, UnmanagedTargets};
pub use discovery::{DiscoveryConfig, DiscoveryMode};
pub use error::ConfigError;
pub use group::{GroupConfig, WorkerConfig};
pub use logging::{LogFormat, LoggingConfig};
pub use probe::{MetricSource, ProbeConfig};
pub use routing::RoutingConfig;
pub use server::ServerConfig;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Unified configuration for the Rudder daemon.
///
/// Aggregates all configuration sections: the operational API server, probing,
/// convergence, discovery, the routing collaborator, worker groups, and logging.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RudderConfig {
    /// Operational API server configuration
    pub server: ServerConfig,
    /// Worker probing configuration
    pub probe: ProbeConfig,
    /// Routing convergence configuration
    pub converge: ConvergeConfig,
    /// Worker discovery settings
    pub discovery: DiscoveryConfig,
    /// Load balancer admin API settings
    pub routing: RoutingConfig,
    /// Worker group definitions
    pub groups: Vec<GroupConfig>,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl RudderConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports RUDDER_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("RUDDER_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("RUDDER_HOST") {
            self.server.host = host;
        }

        if let Ok(level) = std::env::var("RUDDER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("RUDDER_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(interval) = std::env::var("RUDDER_PROBE_INTERVAL") {
            if let Ok(i) = interval.parse() {
                self.probe.interval_seconds = i;
            }
        }
        if let Ok(metric) = std::env::var("RUDDER_METRIC") {
            if let Ok(m) = metric.parse() {
                self.probe.metric = m;
            }
        }

        self
    }

    /// Validate configuration
    ///
    /// Invalid configuration is fatal at startup; nothing here is retried.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation {
                field: "server.port".to_string(),
                message: "port must be non-zero".to_string(),
            });
        }

        if self.probe.interval_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "probe.interval_seconds".to_string(),
                message: "interval must be non-zero".to_string(),
            });
        }
        if self.probe.timeout_ms == 0 {
            return Err(ConfigError::Validation {
                field: "probe.timeout_ms".to_string(),
                message: "timeout must be non-zero".to_string(),
            });
        }
        if self.probe.concurrency == 0 {
            return Err(ConfigError::Validation {
                field: "probe.concurrency".to_string(),
                message: "concurrency must be non-zero".to_string(),
            });
        }

        if self.converge.max_attempts == 0 {
            return Err(ConfigError::Validation {
                field: "converge.max_attempts".to_string(),
                message: "at least one attempt is required".to_string(),
            });
        }

        if self.discovery.mode == DiscoveryMode::Http && self.discovery.inventory_url.is_none() {
            return Err(ConfigError::Validation {
                field: "discovery.inventory_url".to_string(),
                message: "required when discovery.mode = \"http\"".to_string(),
            });
        }

        if self.routing.admin_url.is_empty() {
            return Err(ConfigError::Validation {
                field: "routing.admin_url".to_string(),
                message: "admin URL cannot be empty".to_string(),
            });
        }

        let mut group_names = HashSet::new();
        let mut worker_ids = HashSet::new();
        for (i, group) in self.groups.iter().enumerate() {
            if group.name.is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("groups[{}].name", i),
                    message: "name cannot be empty".to_string(),
                });
            }
            if group.routing_target.is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("groups[{}].routing_target", i),
                    message: "routing target cannot be empty".to_string(),
                });
            }
            if !group_names.insert(group.name.clone()) {
                return Err(ConfigError::Validation {
                    field: format!("groups[{}].name", i),
                    message: format!("duplicate group name '{}'", group.name),
                });
            }
            if let Some(pattern) = &group.member_pattern {
                if let Err(e) = globset::Glob::new(pattern) {
                    return Err(ConfigError::Validation {
                        field: format!("groups[{}].member_pattern", i),
                        message: e.to_string(),
                    });
                }
            }
            for (j, worker) in group.workers.iter().enumerate() {
                if worker.address.is_empty() {
                    return Err(ConfigError::Validation {
                        field: format!("groups[{}].workers[{}].address", i, j),
                        message: "address cannot be empty".to_string(),
                    });
                }
                // A worker belongs to exactly one group.
                if let Some(id) = &worker.id {
                    if !worker_ids.insert(id.clone()) {
                        return Err(ConfigError::Validation {
                            field: format!("groups[{}].workers[{}].id", i, j),
                            message: format!("worker id '{}' appears more than once", id),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}
