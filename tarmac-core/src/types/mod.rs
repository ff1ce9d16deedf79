mod lease;
mod outcome;
mod primitives;

pub(crate) use lease::{Grant, Reservation, Resolution};
pub use lease::{LandingLease, LeaseInfo, TakeOffLease};
pub use outcome::{PerformResult, RequestResult};
pub use primitives::{
    AircraftId, BrokerId, LeaseId, LeaseKind, RunwayId, RunwayState, StandId, StandState,
};
