//! # tarmac-core
//!
//! Lease-based admission control for a fixed pool of runways and parking
//! stands. Clients request time-bound leases that reserve resources, then
//! commit them with a perform call that races safely against the lease's
//! own expiration.

pub mod broker;
pub mod config;
pub mod error;
pub mod pool;
pub mod timer;
pub mod types;

pub use broker::{Broker, BrokerStats};
pub use config::BrokerConfig;
pub use error::BrokerError;

#[cfg(test)]
mod pool_test;
