//! Error types for worker probing.

use thiserror::Error;

/// Ways a single probe can fail.
///
/// A probe failure is always local to one worker: it excludes that worker
/// from ranking for the cycle and nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Probe did not complete within the configured timeout
    #[error("probe timeout after {0}ms")]
    Timeout(u64),

    /// Connection failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Worker responded with a non-success status
    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    /// Stats endpoint responded but the payload was unusable
    #[error("invalid stats payload: {0}")]
    InvalidPayload(String),

    /// Probe abandoned because the cycle was cancelled
    #[error("probe cancelled")]
    Cancelled,
}
