use serde::{Deserialize, Serialize};

/// Result of asking for a lease
#[derive(Debug)]
pub enum RequestResult<L> {
    /// No capacity right now. Nothing was reserved; retry later.
    Hold,
    /// Resources are reserved under the returned lease
    Proceed(L),
}

impl<L> RequestResult<L> {
    pub fn is_proceed(&self) -> bool {
        matches!(self, RequestResult::Proceed(_))
    }

    pub fn is_hold(&self) -> bool {
        matches!(self, RequestResult::Hold)
    }

    /// The lease, if one was granted
    pub fn lease(self) -> Option<L> {
        match self {
            RequestResult::Proceed(lease) => Some(lease),
            RequestResult::Hold => None,
        }
    }
}

/// Result of committing a lease
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PerformResult {
    /// The runway is in operation; the call did not wait for it to finish
    Success,
    /// The validity window passed first; the reservation has been released
    ExpiredToken,
    /// The reserved resources were not in the expected state. The
    /// reservation has been released.
    InvalidParameters,
}

impl PerformResult {
    pub fn is_success(self) -> bool {
        self == PerformResult::Success
    }
}

impl std::fmt::Display for PerformResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PerformResult::Success => write!(f, "SUCCESS"),
            PerformResult::ExpiredToken => write!(f, "EXPIRED_TOKEN"),
            PerformResult::InvalidParameters => write!(f, "INVALID_PARAMETERS"),
        }
    }
}
