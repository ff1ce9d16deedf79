use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generates a fresh, random identity.
            pub fn generate() -> Self {
                Self(format!("{}_{}", $prefix, nanoid::nanoid!(12)))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_type!(
    /// Identity of a runway in the pool
    RunwayId,
    "rwy"
);
id_type!(
    /// Identity of a parking stand in the pool
    StandId,
    "stand"
);
id_type!(
    /// Identity of a client aircraft. Supplied by the caller.
    AircraftId,
    "acft"
);
id_type!(
    /// Identity of an issued lease
    LeaseId,
    "lease"
);
id_type!(
    /// Identity of a broker instance, stamped on every lease it issues
    BrokerId,
    "broker"
);

/// Runway states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunwayState {
    /// Free for the next request
    Available,
    /// Held by an unresolved lease
    Reserved,
    /// A landing or take-off is running on it
    InOperation,
}

/// Parking stand states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StandState {
    /// Free for the next request
    Available,
    /// Held by an unresolved landing lease
    Reserved,
    /// An aircraft has landed and is parked here
    Occupied,
}

impl std::fmt::Display for RunwayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunwayState::Available => write!(f, "AVAILABLE"),
            RunwayState::Reserved => write!(f, "RESERVED"),
            RunwayState::InOperation => write!(f, "IN_OPERATION"),
        }
    }
}

impl std::fmt::Display for StandState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StandState::Available => write!(f, "AVAILABLE"),
            StandState::Reserved => write!(f, "RESERVED"),
            StandState::Occupied => write!(f, "OCCUPIED"),
        }
    }
}

/// Which operation a lease authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaseKind {
    Landing,
    TakeOff,
}

impl std::fmt::Display for LeaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeaseKind::Landing => write!(f, "LANDING"),
            LeaseKind::TakeOff => write!(f, "TAKE_OFF"),
        }
    }
}
