use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::{AircraftId, BrokerId, LeaseId, LeaseKind, RunwayId, StandId};
use crate::timer::DeferredTask;

/// Shared between a lease and its expiration callback.
///
/// `resolved` is flipped exactly once, by whichever of perform or the
/// expiration callback gets there first. Both sides flip it with the
/// broker lock held, so the winner also owns the pool mutation.
#[derive(Debug, Default)]
pub(crate) struct Resolution {
    resolved: AtomicBool,
    expired: AtomicBool,
}

impl Resolution {
    /// Claims the lease. Returns false if it was already claimed.
    pub(crate) fn try_resolve(&self) -> bool {
        self.resolved
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn mark_expired(&self) {
        self.expired.store(true, Ordering::Release);
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }

    pub(crate) fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }
}

/// The resources a lease holds in `Reserved` state
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reservation {
    Landing { runway: RunwayId, stand: StandId },
    TakeOff { runway: RunwayId },
}

impl Reservation {
    pub(crate) fn kind(&self) -> LeaseKind {
        match self {
            Reservation::Landing { .. } => LeaseKind::Landing,
            Reservation::TakeOff { .. } => LeaseKind::TakeOff,
        }
    }

    pub(crate) fn runway(&self) -> &RunwayId {
        match self {
            Reservation::Landing { runway, .. } | Reservation::TakeOff { runway } => runway,
        }
    }

    pub(crate) fn stand(&self) -> Option<&StandId> {
        match self {
            Reservation::Landing { stand, .. } => Some(stand),
            Reservation::TakeOff { .. } => None,
        }
    }
}

/// State common to both lease kinds
#[derive(Debug)]
pub(crate) struct Grant {
    pub(crate) id: LeaseId,
    pub(crate) broker: BrokerId,
    pub(crate) aircraft: AircraftId,
    pub(crate) expires_at: Instant,
    pub(crate) resolution: Arc<Resolution>,
    pub(crate) expiry: DeferredTask,
}

/// Serializable description of a lease
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseInfo {
    pub id: LeaseId,
    pub kind: LeaseKind,
    pub aircraft: AircraftId,
    pub runway: RunwayId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stand: Option<StandId>,
    /// Milliseconds left in the validity window; 0 once it has passed
    pub expires_in_ms: u64,
    pub expired: bool,
}

/// Authorization to land: holds one runway and one parking stand.
///
/// Consumed by [`Broker::perform_landing`](crate::Broker::perform_landing).
/// Dropping it unused is fine; the reservation is released when it expires.
#[derive(Debug)]
pub struct LandingLease {
    pub(crate) grant: Grant,
    pub(crate) runway: RunwayId,
    pub(crate) stand: StandId,
}

/// Authorization to take off: holds one runway.
///
/// Consumed by [`Broker::perform_take_off`](crate::Broker::perform_take_off).
#[derive(Debug)]
pub struct TakeOffLease {
    pub(crate) grant: Grant,
    pub(crate) runway: RunwayId,
}

impl LandingLease {
    pub fn stand(&self) -> &StandId {
        &self.stand
    }

    pub fn kind(&self) -> LeaseKind {
        LeaseKind::Landing
    }

    pub(crate) fn reservation(&self) -> Reservation {
        Reservation::Landing {
            runway: self.runway.clone(),
            stand: self.stand.clone(),
        }
    }
}

impl TakeOffLease {
    pub fn kind(&self) -> LeaseKind {
        LeaseKind::TakeOff
    }

    pub(crate) fn reservation(&self) -> Reservation {
        Reservation::TakeOff {
            runway: self.runway.clone(),
        }
    }
}

macro_rules! lease_accessors {
    ($lease:ident) => {
        impl $lease {
            pub fn id(&self) -> &LeaseId {
                &self.grant.id
            }

            pub fn aircraft(&self) -> &AircraftId {
                &self.grant.aircraft
            }

            pub fn runway(&self) -> &RunwayId {
                &self.runway
            }

            pub fn expires_at(&self) -> Instant {
                self.grant.expires_at
            }

            /// Time left before the lease expires
            pub fn remaining(&self) -> Duration {
                self.grant
                    .expires_at
                    .saturating_duration_since(Instant::now())
            }

            /// True once the expiration callback has released the reservation
            pub fn is_expired(&self) -> bool {
                self.grant.resolution.is_expired()
            }

            /// True once the lease can no longer be performed successfully
            pub fn is_resolved(&self) -> bool {
                self.grant.resolution.is_resolved()
            }

            pub fn info(&self) -> LeaseInfo {
                let reservation = self.reservation();
                LeaseInfo {
                    id: self.grant.id.clone(),
                    kind: reservation.kind(),
                    aircraft: self.grant.aircraft.clone(),
                    runway: reservation.runway().clone(),
                    stand: reservation.stand().cloned(),
                    expires_in_ms: self.remaining().as_millis() as u64,
                    expired: self.is_expired(),
                }
            }
        }
    };
}

lease_accessors!(LandingLease);
lease_accessors!(TakeOffLease);
