//! Routing collaborator.
//!
//! The load balancer's registered-target sets are the one piece of shared
//! mutable state in the system, and the collaborator owns them. Every read
//! may be stale the moment it returns and every write must be safe to
//! repeat, so mutations are expressed as idempotent intent: registering an
//! already-registered target or deregistering an absent one reports
//! `AlreadySatisfied`, which callers absorb as success.

use crate::config::RoutingConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Errors from the routing collaborator, classified by how to react.
#[derive(Debug, Clone, Error)]
pub enum RouterError {
    /// Worth retrying with backoff (e.g. target not yet routable, 5xx, network)
    #[error("transient routing failure: {0}")]
    Transient(String),

    /// Not worth retrying (e.g. unknown routing target); operator attention needed
    #[error("permanent routing failure: {0}")]
    Permanent(String),

    /// The target set already matches the requested mutation
    #[error("target already in requested state")]
    AlreadySatisfied,
}

impl RouterError {
    pub fn is_transient(&self) -> bool {
        matches!(self, RouterError::Transient(_))
    }
}

/// Read and mutate the registered-target set of a routing target.
#[async_trait]
pub trait TargetRouter: Send + Sync {
    /// The live registered set. Callers must re-read before every diff;
    /// other actors may touch the set between cycles.
    async fn registered_targets(&self, routing_target: &str)
        -> Result<HashSet<String>, RouterError>;

    async fn register(&self, routing_target: &str, worker_id: &str) -> Result<(), RouterError>;

    async fn deregister(&self, routing_target: &str, worker_id: &str) -> Result<(), RouterError>;
}

#[derive(Debug, Deserialize)]
struct TargetsResponse {
    targets: Vec<String>,
}

/// Routing collaborator backed by a load balancer admin API.
///
/// Contract: `GET /v1/targets/{rt}` returns `{"targets": [...]}` (404 means
/// the routing target id itself is unknown); `PUT` and `DELETE` on
/// `/v1/targets/{rt}/{worker}` mutate membership, answering 409 for an
/// already-registered worker and 404 for an already-absent one.
pub struct HttpRouter {
    client: reqwest::Client,
    admin_url: String,
}

impl HttpRouter {
    pub fn new(config: &RoutingConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            admin_url: config.admin_url.trim_end_matches('/').to_string(),
        }
    }

    fn targets_url(&self, routing_target: &str) -> String {
        format!("{}/v1/targets/{}", self.admin_url, routing_target)
    }

    fn member_url(&self, routing_target: &str, worker_id: &str) -> String {
        format!("{}/{}", self.targets_url(routing_target), worker_id)
    }

    fn transport_error(e: reqwest::Error) -> RouterError {
        // Timeouts and connection problems are always worth retrying.
        RouterError::Transient(e.to_string())
    }
}

/// Map a mutation response status to a router result.
fn classify_mutation_status(status: u16) -> Result<(), RouterError> {
    match status {
        200..=299 => Ok(()),
        404 | 409 => Err(RouterError::AlreadySatisfied),
        400 | 401 | 403 | 422 => Err(RouterError::Permanent(format!("HTTP {}", status))),
        _ => Err(RouterError::Transient(format!("HTTP {}", status))),
    }
}

#[async_trait]
impl TargetRouter for HttpRouter {
    async fn registered_targets(
        &self,
        routing_target: &str,
    ) -> Result<HashSet<String>, RouterError> {
        let response = self
            .client
            .get(self.targets_url(routing_target))
            .send()
            .await
            .map_err(Self::transport_error)?;

        match response.status().as_u16() {
            200..=299 => {
                let body: TargetsResponse = response
                    .json()
                    .await
                    .map_err(|e| RouterError::Transient(e.to_string()))?;
                Ok(body.targets.into_iter().collect())
            }
            404 => Err(RouterError::Permanent(format!(
                "unknown routing target '{}'",
                routing_target
            ))),
            status if (400..500).contains(&status) => {
                Err(RouterError::Permanent(format!("HTTP {}", status)))
            }
            status => Err(RouterError::Transient(format!("HTTP {}", status))),
        }
    }

    async fn register(&self, routing_target: &str, worker_id: &str) -> Result<(), RouterError> {
        let response = self
            .client
            .put(self.member_url(routing_target, worker_id))
            .send()
            .await
            .map_err(Self::transport_error)?;

        classify_mutation_status(response.status().as_u16())
    }

    async fn deregister(&self, routing_target: &str, worker_id: &str) -> Result<(), RouterError> {
        let response = self
            .client
            .delete(self.member_url(routing_target, worker_id))
            .send()
            .await
            .map_err(Self::transport_error)?;

        classify_mutation_status(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_success_statuses() {
        assert!(classify_mutation_status(200).is_ok());
        assert!(classify_mutation_status(201).is_ok());
        assert!(classify_mutation_status(204).is_ok());
    }

    #[test]
    fn test_mutation_already_satisfied() {
        assert!(matches!(
            classify_mutation_status(404),
            Err(RouterError::AlreadySatisfied)
        ));
        assert!(matches!(
            classify_mutation_status(409),
            Err(RouterError::AlreadySatisfied)
        ));
    }

    #[test]
    fn test_mutation_permanent_statuses() {
        for status in [400, 401, 403, 422] {
            assert!(matches!(
                classify_mutation_status(status),
                Err(RouterError::Permanent(_))
            ));
        }
    }

    #[test]
    fn test_mutation_transient_statuses() {
        for status in [500, 502, 503, 429] {
            assert!(matches!(
                classify_mutation_status(status),
                Err(RouterError::Transient(_))
            ));
        }
    }

    #[test]
    fn test_is_transient() {
        assert!(RouterError::Transient("x".to_string()).is_transient());
        assert!(!RouterError::Permanent("x".to_string()).is_transient());
        assert!(!RouterError::AlreadySatisfied.is_transient());
    }

    #[test]
    fn test_urls_trim_trailing_slash() {
        let config = RoutingConfig {
            admin_url: "http://127.0.0.1:8404/".to_string(),
            timeout_ms: 1000,
        };
        let router = HttpRouter::new(&config);
        assert_eq!(
            router.member_url("rt-1", "w1"),
            "http://127.0.0.1:8404/v1/targets/rt-1/w1"
        );
    }
}
