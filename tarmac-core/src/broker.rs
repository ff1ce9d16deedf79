//! Admission control over the resource pool.
//!
//! Every read-then-write on the pool happens inside one acquisition of the
//! broker's state lock. Leases and runway operations arm deferred callbacks
//! that take the same lock when they fire. A lease is settled exactly once:
//! perform and the expiration callback both compare-and-set the lease's
//! resolution cell while holding the lock, and only the winner touches the
//! pool.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::time::Instant;

use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::pool::{PoolSnapshot, ResourcePool, RunwayView, StandView};
use crate::timer::DeferredTask;
use crate::types::{
    AircraftId, BrokerId, Grant, LandingLease, LeaseId, LeaseKind, PerformResult, RequestResult,
    Reservation, Resolution, RunwayId, RunwayState, StandId, StandState, TakeOffLease,
};

/// Monotonic broker counters.
///
/// Once every lease has settled,
/// `leases_granted == leases_committed + leases_expired + invalid_performs`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerStats {
    pub holds: u64,
    pub leases_granted: u64,
    pub leases_committed: u64,
    pub leases_expired: u64,
    /// Reservations handed back to the pool without being used
    pub releases: u64,
    pub invalid_performs: u64,
    pub operations_completed: u64,
}

#[derive(Debug)]
pub(crate) struct BrokerState {
    pub(crate) pool: ResourcePool,
    pub(crate) stats: BrokerStats,
}

impl BrokerState {
    fn release(&mut self, reservation: &Reservation) {
        self.pool.release_runway(reservation.runway());
        if let Some(stand) = reservation.stand() {
            self.pool.release_parking_stand(stand);
        }
        self.stats.releases += 1;
    }
}

pub(crate) struct Shared {
    id: BrokerId,
    config: BrokerConfig,
    runtime: Handle,
    state: Mutex<BrokerState>,
}

impl Shared {
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, BrokerState>, BrokerError> {
        self.state.lock().map_err(|_| BrokerError::Poisoned)
    }

    /// Fired by a lease's expiration timer.
    fn expire(&self, lease: &LeaseId, resolution: &Resolution, reservation: &Reservation) {
        let mut state = match self.lock() {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(lease_id = %lease, "Lease expiry skipped: {}", e);
                return;
            }
        };

        if !resolution.try_resolve() {
            tracing::trace!(lease_id = %lease, "Lease already settled before expiry fired");
            return;
        }

        resolution.mark_expired();
        state.release(reservation);
        state.stats.leases_expired += 1;
        tracing::info!(
            lease_id = %lease,
            kind = %reservation.kind(),
            runway = %reservation.runway(),
            "Lease expired, reservation released"
        );
    }

    /// Fired by a runway's operation timer.
    ///
    /// `stand` is the landing's stand; a take-off passes `None`.
    fn complete_operation(
        &self,
        runway_id: &RunwayId,
        aircraft: &AircraftId,
        stand: Option<&StandId>,
    ) {
        let mut state = match self.lock() {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(runway = %runway_id, "Operation completion skipped: {}", e);
                return;
            }
        };

        let Some(runway) = state.pool.runway_mut(runway_id) else {
            tracing::error!(runway = %runway_id, "Operation completed on unknown runway");
            return;
        };
        if runway.state != RunwayState::InOperation || runway.aircraft.as_ref() != Some(aircraft) {
            tracing::warn!(
                runway = %runway_id,
                aircraft = %aircraft,
                "Stale operation completion ignored"
            );
            return;
        }

        runway.state = RunwayState::Available;
        runway.aircraft = None;
        runway.operation = None;

        let kind = if stand.is_some() {
            LeaseKind::Landing
        } else {
            LeaseKind::TakeOff
        };
        if let Some(stand_id) = stand {
            match state.pool.parking_stand_mut(stand_id) {
                Some(stand)
                    if stand.state == StandState::Reserved
                        && stand.aircraft.as_ref() == Some(aircraft) =>
                {
                    stand.state = StandState::Occupied;
                }
                _ => tracing::warn!(
                    aircraft = %aircraft,
                    stand = %stand_id,
                    "Landed aircraft's stand is no longer reserved for it"
                ),
            }
        }

        state.stats.operations_completed += 1;
        tracing::debug!(runway = %runway_id, aircraft = %aircraft, kind = %kind, "Operation complete");
    }
}

/// The lease broker. Cheap to clone; clones share one pool.
///
/// Timers run on the tokio runtime captured at construction. All operations
/// are synchronous and return without waiting on any timer.
#[derive(Clone)]
pub struct Broker {
    pub(crate) shared: Arc<Shared>,
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("id", &self.shared.id)
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl Broker {
    /// Creates a broker on the current tokio runtime.
    pub fn new(config: BrokerConfig) -> Result<Self, BrokerError> {
        let runtime = Handle::try_current().map_err(|_| BrokerError::NoRuntime)?;
        Self::with_runtime(config, runtime)
    }

    /// Creates a broker whose timers run on `runtime`.
    pub fn with_runtime(config: BrokerConfig, runtime: Handle) -> Result<Self, BrokerError> {
        config.validate()?;

        let pool = ResourcePool::new(
            config.runways,
            config.parking_stands,
            config.operation_duration,
        );
        let id = BrokerId::generate();
        tracing::info!(
            broker = %id,
            runways = config.runways,
            parking_stands = config.parking_stands,
            "Broker ready"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                id,
                config,
                runtime,
                state: Mutex::new(BrokerState {
                    pool,
                    stats: BrokerStats::default(),
                }),
            }),
        })
    }

    pub fn id(&self) -> &BrokerId {
        &self.shared.id
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.shared.config
    }

    // ─── Requests ───────────────────────────────────────────────────────────

    /// Reserves a runway and a parking stand for `aircraft` if both are free.
    pub fn request_landing(
        &self,
        aircraft: &AircraftId,
    ) -> Result<RequestResult<LandingLease>, BrokerError> {
        let mut state = self.shared.lock()?;

        if state.pool.available_runways() == 0 || state.pool.available_parking_stands() == 0 {
            state.stats.holds += 1;
            tracing::debug!(aircraft = %aircraft, "Landing held, no capacity");
            return Ok(RequestResult::Hold);
        }

        let runway = state.pool.reserve_runway(aircraft);
        let stand = state.pool.reserve_parking_stand(aircraft);
        let (runway, stand) = match (runway, stand) {
            (Some(runway), Some(stand)) => (runway, stand),
            (runway, stand) => {
                // Counts said yes but a scan came up empty; undo the half we got.
                if let Some(runway) = runway {
                    state.pool.release_runway(&runway);
                }
                if let Some(stand) = stand {
                    state.pool.release_parking_stand(&stand);
                }
                state.stats.holds += 1;
                tracing::warn!(aircraft = %aircraft, "Landing held, pool scan disagreed with counts");
                return Ok(RequestResult::Hold);
            }
        };

        let reservation = Reservation::Landing {
            runway: runway.clone(),
            stand: stand.clone(),
        };
        let grant = self.grant(&mut state, aircraft, reservation);
        tracing::debug!(
            lease_id = %grant.id,
            aircraft = %aircraft,
            runway = %runway,
            stand = %stand,
            "Landing lease granted"
        );

        Ok(RequestResult::Proceed(LandingLease {
            grant,
            runway,
            stand,
        }))
    }

    /// Reserves a runway for `aircraft` if one is free.
    pub fn request_take_off(
        &self,
        aircraft: &AircraftId,
    ) -> Result<RequestResult<TakeOffLease>, BrokerError> {
        let mut state = self.shared.lock()?;

        if state.pool.available_runways() == 0 {
            state.stats.holds += 1;
            tracing::debug!(aircraft = %aircraft, "Take-off held, no capacity");
            return Ok(RequestResult::Hold);
        }

        let Some(runway) = state.pool.reserve_runway(aircraft) else {
            state.stats.holds += 1;
            tracing::warn!(aircraft = %aircraft, "Take-off held, pool scan disagreed with counts");
            return Ok(RequestResult::Hold);
        };

        let reservation = Reservation::TakeOff {
            runway: runway.clone(),
        };
        let grant = self.grant(&mut state, aircraft, reservation);
        tracing::debug!(
            lease_id = %grant.id,
            aircraft = %aircraft,
            runway = %runway,
            "Take-off lease granted"
        );

        Ok(RequestResult::Proceed(TakeOffLease { grant, runway }))
    }

    /// Issues a lease over an already-reserved `reservation` and arms its
    /// expiration. The timer cannot act before `state` is unlocked.
    fn grant(
        &self,
        state: &mut BrokerState,
        aircraft: &AircraftId,
        reservation: Reservation,
    ) -> Grant {
        let id = LeaseId::generate();
        let validity = self.shared.config.lease_validity;
        let expires_at = Instant::now() + validity;
        let resolution = Arc::new(Resolution::default());

        let expiry = {
            let shared: Weak<Shared> = Arc::downgrade(&self.shared);
            let resolution = Arc::clone(&resolution);
            let id = id.clone();
            DeferredTask::schedule(&self.shared.runtime, validity, move || {
                if let Some(shared) = shared.upgrade() {
                    shared.expire(&id, &resolution, &reservation);
                }
            })
        };

        state.stats.leases_granted += 1;

        Grant {
            id,
            broker: self.shared.id.clone(),
            aircraft: aircraft.clone(),
            expires_at,
            resolution,
            expiry,
        }
    }

    // ─── Performs ───────────────────────────────────────────────────────────

    /// Commits a landing lease: the runway goes into operation and, when the
    /// operation finishes, the stand becomes occupied. Does not wait for the
    /// operation.
    pub fn perform_landing(&self, lease: LandingLease) -> Result<PerformResult, BrokerError> {
        self.check_issuer(&lease.grant)?;
        let reservation = lease.reservation();
        let mut state = self.shared.lock()?;

        if let Some(outcome) = self.settle(&mut state, &lease.grant, &reservation) {
            return Ok(outcome);
        }

        let runway_reserved = state
            .pool
            .runway(&lease.runway)
            .is_some_and(|r| r.state == RunwayState::Reserved);
        let stand_reserved = state
            .pool
            .parking_stand(&lease.stand)
            .is_some_and(|s| s.state == StandState::Reserved);
        if !runway_reserved || !stand_reserved {
            return Ok(self.reject(&mut state, &lease.grant, &reservation));
        }

        let aircraft = &lease.grant.aircraft;
        if let Some(stand) = state.pool.parking_stand_mut(&lease.stand) {
            stand.aircraft = Some(aircraft.clone());
        }
        self.start_operation(&mut state, &lease.runway, aircraft, Some(&lease.stand));
        state.stats.leases_committed += 1;

        tracing::info!(
            lease_id = %lease.grant.id,
            aircraft = %aircraft,
            runway = %lease.runway,
            stand = %lease.stand,
            "Landing cleared"
        );
        Ok(PerformResult::Success)
    }

    /// Commits a take-off lease: the aircraft's stand is freed at once and
    /// the runway goes into operation. Does not wait for the operation.
    pub fn perform_take_off(&self, lease: TakeOffLease) -> Result<PerformResult, BrokerError> {
        self.check_issuer(&lease.grant)?;
        let reservation = lease.reservation();
        let mut state = self.shared.lock()?;

        if let Some(outcome) = self.settle(&mut state, &lease.grant, &reservation) {
            return Ok(outcome);
        }

        let runway_reserved = state
            .pool
            .runway(&lease.runway)
            .is_some_and(|r| r.state == RunwayState::Reserved);
        if !runway_reserved {
            return Ok(self.reject(&mut state, &lease.grant, &reservation));
        }

        let aircraft = &lease.grant.aircraft;
        match state
            .pool
            .parking_stand_by_aircraft_mut(aircraft, StandState::Occupied)
        {
            Some(stand) => {
                stand.state = StandState::Available;
                stand.aircraft = None;
            }
            None => tracing::warn!(aircraft = %aircraft, "Departing aircraft holds no stand"),
        }
        self.start_operation(&mut state, &lease.runway, aircraft, None);
        state.stats.leases_committed += 1;

        tracing::info!(
            lease_id = %lease.grant.id,
            aircraft = %aircraft,
            runway = %lease.runway,
            "Take-off cleared"
        );
        Ok(PerformResult::Success)
    }

    fn check_issuer(&self, grant: &Grant) -> Result<(), BrokerError> {
        if grant.broker != self.shared.id {
            return Err(BrokerError::ForeignLease {
                lease: grant.id.clone(),
            });
        }
        Ok(())
    }

    /// Cancels the lease's expiry and claims the lease for this perform.
    /// Returns an outcome if the lease cannot be committed, `None` if the
    /// caller owns the reservation and may commit it.
    fn settle(
        &self,
        state: &mut BrokerState,
        grant: &Grant,
        reservation: &Reservation,
    ) -> Option<PerformResult> {
        grant.expiry.cancel();

        if !grant.resolution.try_resolve() {
            // The expiry callback won and has already released everything.
            tracing::debug!(lease_id = %grant.id, "Perform on expired lease");
            return Some(PerformResult::ExpiredToken);
        }

        if Instant::now() > grant.expires_at {
            grant.resolution.mark_expired();
            state.release(reservation);
            state.stats.leases_expired += 1;
            tracing::info!(
                lease_id = %grant.id,
                aircraft = %grant.aircraft,
                "Lease window passed before perform, reservation released"
            );
            return Some(PerformResult::ExpiredToken);
        }

        None
    }

    fn reject(
        &self,
        state: &mut BrokerState,
        grant: &Grant,
        reservation: &Reservation,
    ) -> PerformResult {
        state.release(reservation);
        state.stats.invalid_performs += 1;
        tracing::warn!(
            lease_id = %grant.id,
            aircraft = %grant.aircraft,
            runway = %reservation.runway(),
            "Leased resources were not reserved, forced release"
        );
        PerformResult::InvalidParameters
    }

    fn start_operation(
        &self,
        state: &mut BrokerState,
        runway_id: &RunwayId,
        aircraft: &AircraftId,
        stand: Option<&StandId>,
    ) {
        let Some(runway) = state.pool.runway_mut(runway_id) else {
            return;
        };

        let task = {
            let shared: Weak<Shared> = Arc::downgrade(&self.shared);
            let runway_id = runway_id.clone();
            let aircraft = aircraft.clone();
            let stand = stand.cloned();
            DeferredTask::schedule(&self.shared.runtime, runway.operation_duration, move || {
                if let Some(shared) = shared.upgrade() {
                    shared.complete_operation(&runway_id, &aircraft, stand.as_ref());
                }
            })
        };

        runway.aircraft = Some(aircraft.clone());
        runway.state = RunwayState::InOperation;
        runway.operation = Some(task);
    }

    // ─── Inspection ─────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Result<PoolSnapshot, BrokerError> {
        Ok(self.shared.lock()?.pool.snapshot())
    }

    pub fn stats(&self) -> Result<BrokerStats, BrokerError> {
        Ok(self.shared.lock()?.stats)
    }

    pub fn runways(&self) -> Result<Vec<RunwayView>, BrokerError> {
        let state = self.shared.lock()?;
        Ok(state.pool.runways().iter().map(|r| r.view()).collect())
    }

    pub fn parking_stands(&self) -> Result<Vec<StandView>, BrokerError> {
        let state = self.shared.lock()?;
        Ok(state.pool.parking_stands().iter().map(|s| s.view()).collect())
    }
}
