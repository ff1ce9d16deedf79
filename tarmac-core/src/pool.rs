//! The fixed collection of runways and parking stands.
//!
//! Nothing here locks. The broker only touches a pool while holding its
//! state lock.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::timer::DeferredTask;
use crate::types::{AircraftId, RunwayId, RunwayState, StandId, StandState};

#[derive(Debug)]
pub struct Runway {
    pub id: RunwayId,
    pub operation_duration: Duration,
    pub state: RunwayState,
    pub aircraft: Option<AircraftId>,
    /// Armed while the runway is in operation
    pub operation: Option<DeferredTask>,
}

impl Runway {
    fn new(operation_duration: Duration) -> Self {
        Self {
            id: RunwayId::generate(),
            operation_duration,
            state: RunwayState::Available,
            aircraft: None,
            operation: None,
        }
    }

    pub fn view(&self) -> RunwayView {
        RunwayView {
            id: self.id.clone(),
            state: self.state,
            aircraft: self.aircraft.clone(),
        }
    }
}

#[derive(Debug)]
pub struct ParkingStand {
    pub id: StandId,
    pub state: StandState,
    pub aircraft: Option<AircraftId>,
}

impl ParkingStand {
    fn new() -> Self {
        Self {
            id: StandId::generate(),
            state: StandState::Available,
            aircraft: None,
        }
    }

    pub fn view(&self) -> StandView {
        StandView {
            id: self.id.clone(),
            state: self.state,
            aircraft: self.aircraft.clone(),
        }
    }
}

/// Point-in-time view of one runway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunwayView {
    pub id: RunwayId,
    pub state: RunwayState,
    pub aircraft: Option<AircraftId>,
}

/// Point-in-time view of one parking stand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandView {
    pub id: StandId,
    pub state: StandState,
    pub aircraft: Option<AircraftId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunwayCounts {
    pub available: usize,
    pub reserved: usize,
    pub in_operation: usize,
}

impl RunwayCounts {
    pub fn total(&self) -> usize {
        self.available + self.reserved + self.in_operation
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandCounts {
    pub available: usize,
    pub reserved: usize,
    pub occupied: usize,
}

impl StandCounts {
    pub fn total(&self) -> usize {
        self.available + self.reserved + self.occupied
    }
}

/// Per-state resource counts alongside the configured pool sizes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub runways: RunwayCounts,
    pub parking_stands: StandCounts,
    pub total_runways: usize,
    pub total_parking_stands: usize,
}

impl PoolSnapshot {
    /// True when every configured resource is in exactly one state.
    pub fn is_conserved(&self) -> bool {
        self.runways.total() == self.total_runways
            && self.parking_stands.total() == self.total_parking_stands
    }
}

#[derive(Debug)]
pub struct ResourcePool {
    runways: Vec<Runway>,
    parking_stands: Vec<ParkingStand>,
}

impl ResourcePool {
    pub fn new(runways: usize, parking_stands: usize, operation_duration: Duration) -> Self {
        Self {
            runways: (0..runways).map(|_| Runway::new(operation_duration)).collect(),
            parking_stands: (0..parking_stands).map(|_| ParkingStand::new()).collect(),
        }
    }

    pub fn runways(&self) -> &[Runway] {
        &self.runways
    }

    pub fn parking_stands(&self) -> &[ParkingStand] {
        &self.parking_stands
    }

    pub fn available_runways(&self) -> usize {
        self.runways
            .iter()
            .filter(|r| r.state == RunwayState::Available)
            .count()
    }

    pub fn available_parking_stands(&self) -> usize {
        self.parking_stands
            .iter()
            .filter(|s| s.state == StandState::Available)
            .count()
    }

    /// Reserves the first available runway for `aircraft`, in pool order.
    pub fn reserve_runway(&mut self, aircraft: &AircraftId) -> Option<RunwayId> {
        let runway = self
            .runways
            .iter_mut()
            .find(|r| r.state == RunwayState::Available)?;
        runway.state = RunwayState::Reserved;
        runway.aircraft = Some(aircraft.clone());
        Some(runway.id.clone())
    }

    /// Reserves the first available parking stand for `aircraft`, in pool order.
    pub fn reserve_parking_stand(&mut self, aircraft: &AircraftId) -> Option<StandId> {
        let stand = self
            .parking_stands
            .iter_mut()
            .find(|s| s.state == StandState::Available)?;
        stand.state = StandState::Reserved;
        stand.aircraft = Some(aircraft.clone());
        Some(stand.id.clone())
    }

    /// Returns the runway to `Available`. False if the id is unknown.
    pub fn release_runway(&mut self, id: &RunwayId) -> bool {
        match self.runway_mut(id) {
            Some(runway) => {
                runway.state = RunwayState::Available;
                runway.aircraft = None;
                if let Some(task) = runway.operation.take() {
                    task.cancel();
                }
                true
            }
            None => false,
        }
    }

    /// Returns the stand to `Available`. False if the id is unknown.
    pub fn release_parking_stand(&mut self, id: &StandId) -> bool {
        match self.parking_stand_mut(id) {
            Some(stand) => {
                stand.state = StandState::Available;
                stand.aircraft = None;
                true
            }
            None => false,
        }
    }

    pub fn runway(&self, id: &RunwayId) -> Option<&Runway> {
        self.runways.iter().find(|r| &r.id == id)
    }

    pub fn runway_mut(&mut self, id: &RunwayId) -> Option<&mut Runway> {
        self.runways.iter_mut().find(|r| &r.id == id)
    }

    pub fn parking_stand(&self, id: &StandId) -> Option<&ParkingStand> {
        self.parking_stands.iter().find(|s| &s.id == id)
    }

    pub fn parking_stand_mut(&mut self, id: &StandId) -> Option<&mut ParkingStand> {
        self.parking_stands.iter_mut().find(|s| &s.id == id)
    }

    /// Finds the stand currently associated with `aircraft` in the given state.
    pub fn parking_stand_by_aircraft_mut(
        &mut self,
        aircraft: &AircraftId,
        state: StandState,
    ) -> Option<&mut ParkingStand> {
        self.parking_stands
            .iter_mut()
            .find(|s| s.state == state && s.aircraft.as_ref() == Some(aircraft))
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        let mut snapshot = PoolSnapshot {
            total_runways: self.runways.len(),
            total_parking_stands: self.parking_stands.len(),
            ..PoolSnapshot::default()
        };
        for runway in &self.runways {
            match runway.state {
                RunwayState::Available => snapshot.runways.available += 1,
                RunwayState::Reserved => snapshot.runways.reserved += 1,
                RunwayState::InOperation => snapshot.runways.in_operation += 1,
            }
        }
        for stand in &self.parking_stands {
            match stand.state {
                StandState::Available => snapshot.parking_stands.available += 1,
                StandState::Reserved => snapshot.parking_stands.reserved += 1,
                StandState::Occupied => snapshot.parking_stands.occupied += 1,
            }
        }
        snapshot
    }
}
