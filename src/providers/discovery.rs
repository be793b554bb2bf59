//! Worker discovery collaborator.

use crate::config::{DiscoveryConfig, GroupConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// A worker as reported by discovery: identity and address, nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredWorker {
    pub id: String,
    pub address: String,
}

/// Errors from the discovery collaborator.
///
/// An unavailable inventory skips the whole cycle; the previous routing
/// state is preserved and the next tick retries.
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    #[error("inventory unavailable: {0}")]
    Unavailable(String),

    #[error("invalid inventory payload: {0}")]
    InvalidPayload(String),

    #[error("invalid member pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Reports the current membership of one worker group.
///
/// Implementations may return a subset when the underlying inventory is
/// transiently incomplete; shrinkage is handled gracefully upstream.
#[async_trait]
pub trait WorkerDiscovery: Send + Sync {
    async fn list_workers(
        &self,
        group: &GroupConfig,
    ) -> Result<Vec<DiscoveredWorker>, DiscoveryError>;
}

/// Discovery backed by the `[[groups.workers]]` tables in the config file.
///
/// Ids omitted from the config are generated once at construction so they
/// stay stable for the lifetime of the process.
pub struct StaticDiscovery {
    members: HashMap<String, Vec<DiscoveredWorker>>,
}

impl StaticDiscovery {
    pub fn from_groups(groups: &[GroupConfig]) -> Self {
        let members = groups
            .iter()
            .map(|group| {
                let workers = group
                    .workers
                    .iter()
                    .map(|w| DiscoveredWorker {
                        id: w
                            .id
                            .clone()
                            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                        address: w.address.clone(),
                    })
                    .collect();
                (group.name.clone(), workers)
            })
            .collect();

        Self { members }
    }
}

#[async_trait]
impl WorkerDiscovery for StaticDiscovery {
    async fn list_workers(
        &self,
        group: &GroupConfig,
    ) -> Result<Vec<DiscoveredWorker>, DiscoveryError> {
        Ok(self.members.get(&group.name).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct InventoryResponse {
    workers: Vec<InventoryEntry>,
}

#[derive(Debug, Deserialize)]
struct InventoryEntry {
    id: String,
    address: String,
    group: String,
}

/// Discovery backed by an HTTP inventory endpoint.
///
/// The endpoint returns every known worker:
/// `{"workers": [{"id": "...", "address": "...", "group": "..."}]}`.
/// Results are filtered to the requested group, then through the group's
/// optional member pattern.
pub struct HttpDiscovery {
    client: reqwest::Client,
    inventory_url: String,
}

impl HttpDiscovery {
    pub fn new(config: &DiscoveryConfig, inventory_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            inventory_url,
        }
    }
}

#[async_trait]
impl WorkerDiscovery for HttpDiscovery {
    async fn list_workers(
        &self,
        group: &GroupConfig,
    ) -> Result<Vec<DiscoveredWorker>, DiscoveryError> {
        let response = self
            .client
            .get(&self.inventory_url)
            .send()
            .await
            .map_err(|e| DiscoveryError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DiscoveryError::Unavailable(format!(
                "inventory returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let inventory: InventoryResponse = response
            .json()
            .await
            .map_err(|e| DiscoveryError::InvalidPayload(e.to_string()))?;

        let matcher = match &group.member_pattern {
            Some(pattern) => Some(
                globset::Glob::new(pattern)
                    .map_err(|e| DiscoveryError::InvalidPattern {
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    })?
                    .compile_matcher(),
            ),
            None => None,
        };

        Ok(inventory
            .workers
            .into_iter()
            .filter(|w| w.group == group.name)
            .filter(|w| matcher.as_ref().map_or(true, |m| m.is_match(&w.id)))
            .map(|w| DiscoveredWorker {
                id: w.id,
                address: w.address,
            })
            .collect())
    }
}
