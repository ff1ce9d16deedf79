use serde::{Deserialize, Serialize};
use tarmac_core::pool::{PoolSnapshot, RunwayView, StandView};
use tarmac_core::types::{LandingLease, LeaseId, LeaseInfo, PerformResult, TakeOffLease};
use tarmac_core::{Broker, BrokerError};
use tokio::time::Instant;

// ─── Validation Constants ───────────────────────────────────────────────────

const MAX_AIRCRAFT_ID_LEN: usize = 64;

// ─── Request Types ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LeaseRequest {
    pub aircraft_id: String,
}

impl LeaseRequest {
    pub fn validate(&self) -> Result<(), String> {
        let id = self.aircraft_id.trim();
        if id.is_empty() {
            return Err("aircraft_id is required".to_string());
        }
        if id.len() > MAX_AIRCRAFT_ID_LEN {
            return Err(format!(
                "aircraft_id must be at most {} characters",
                MAX_AIRCRAFT_ID_LEN
            ));
        }
        if id.chars().any(|c| c.is_control()) {
            return Err("aircraft_id must not contain control characters".to_string());
        }
        Ok(())
    }
}

// ─── Issued Leases ──────────────────────────────────────────────────────────

/// A lease handed out over HTTP and held by the server until performed
pub enum IssuedLease {
    Landing(LandingLease),
    TakeOff(TakeOffLease),
}

impl IssuedLease {
    pub fn id(&self) -> &LeaseId {
        match self {
            IssuedLease::Landing(lease) => lease.id(),
            IssuedLease::TakeOff(lease) => lease.id(),
        }
    }

    pub fn info(&self) -> LeaseInfo {
        match self {
            IssuedLease::Landing(lease) => lease.info(),
            IssuedLease::TakeOff(lease) => lease.info(),
        }
    }

    pub fn expires_at(&self) -> Instant {
        match self {
            IssuedLease::Landing(lease) => lease.expires_at(),
            IssuedLease::TakeOff(lease) => lease.expires_at(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        match self {
            IssuedLease::Landing(lease) => lease.is_resolved(),
            IssuedLease::TakeOff(lease) => lease.is_resolved(),
        }
    }

    pub fn perform(self, broker: &Broker) -> Result<PerformResult, BrokerError> {
        match self {
            IssuedLease::Landing(lease) => broker.perform_landing(lease),
            IssuedLease::TakeOff(lease) => broker.perform_take_off(lease),
        }
    }
}

impl From<LandingLease> for IssuedLease {
    fn from(lease: LandingLease) -> Self {
        IssuedLease::Landing(lease)
    }
}

impl From<TakeOffLease> for IssuedLease {
    fn from(lease: TakeOffLease) -> Self {
        IssuedLease::TakeOff(lease)
    }
}

// ─── Response Types ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[derive(Serialize)]
pub struct PerformResponse {
    pub lease_id: LeaseId,
    pub outcome: PerformResult,
}

#[derive(Serialize)]
pub struct PoolResponse {
    pub counts: PoolSnapshot,
    pub runways: Vec<RunwayView>,
    pub parking_stands: Vec<StandView>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub outstanding_leases: usize,
    pub pool: PoolSnapshot,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::LeaseRequest;

    fn request(id: &str) -> LeaseRequest {
        LeaseRequest {
            aircraft_id: id.to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_plain_id() {
        assert!(request("KLM1234").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_id() {
        assert_eq!(
            request("   ").validate().unwrap_err(),
            "aircraft_id is required"
        );
    }

    #[test]
    fn test_validate_rejects_oversized_and_control_chars() {
        assert!(request(&"x".repeat(65)).validate().is_err());
        assert!(request("bad\nid").validate().is_err());
    }
}
