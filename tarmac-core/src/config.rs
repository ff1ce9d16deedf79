use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BrokerError;

/// Fixed-at-construction broker parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Number of runways in the pool
    pub runways: usize,
    /// Number of parking stands in the pool
    pub parking_stands: usize,
    /// How long a runway stays in operation after a successful perform
    pub operation_duration: Duration,
    /// How long a granted lease stays valid
    pub lease_validity: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            runways: 5,
            parking_stands: 10,
            operation_duration: Duration::from_secs(5),
            lease_validity: Duration::from_secs(2),
        }
    }
}

impl BrokerConfig {
    pub fn new(
        runways: usize,
        parking_stands: usize,
        operation_duration: Duration,
        lease_validity: Duration,
    ) -> Self {
        Self {
            runways,
            parking_stands,
            operation_duration,
            lease_validity,
        }
    }

    pub fn with_runways(mut self, runways: usize) -> Self {
        self.runways = runways;
        self
    }

    pub fn with_parking_stands(mut self, parking_stands: usize) -> Self {
        self.parking_stands = parking_stands;
        self
    }

    pub fn with_operation_duration(mut self, duration: Duration) -> Self {
        self.operation_duration = duration;
        self
    }

    pub fn with_lease_validity(mut self, validity: Duration) -> Self {
        self.lease_validity = validity;
        self
    }

    /// A pool without runways can never grant anything, and a lease with no
    /// validity window is expired on arrival.
    pub fn validate(&self) -> Result<(), BrokerError> {
        if self.runways == 0 {
            return Err(BrokerError::InvalidConfig(
                "runways must be greater than 0".to_string(),
            ));
        }
        if self.lease_validity.is_zero() {
            return Err(BrokerError::InvalidConfig(
                "lease_validity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
