use thiserror::Error;

use crate::types::LeaseId;

/// Faults a caller cannot retry past.
///
/// Capacity exhaustion and expired leases are not errors; they come back as
/// [`RequestResult::Hold`](crate::types::RequestResult::Hold) and
/// [`PerformResult::ExpiredToken`](crate::types::PerformResult::ExpiredToken).
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("invalid broker configuration: {0}")]
    InvalidConfig(String),
    #[error("no tokio runtime available to drive lease and operation timers")]
    NoRuntime,
    #[error("broker state lock poisoned by a panicking holder")]
    Poisoned,
    #[error("lease {lease} was issued by a different broker")]
    ForeignLease { lease: LeaseId },
}
