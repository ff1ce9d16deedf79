//! Simulated aircraft driving the broker through its caller contract.
//!
//! Each aircraft lands, waits on the stand, then takes off. A `Hold` is
//! retried after a random backoff; a granted lease is sometimes sat on past
//! its expiry on purpose, and any non-success perform restarts the cycle.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use serde::Serialize;
use tarmac_core::pool::PoolSnapshot;
use tarmac_core::types::{AircraftId, PerformResult, RequestResult};
use tarmac_core::{Broker, BrokerConfig, BrokerError, BrokerStats};
use tokio::task::JoinSet;

const BACKOFF_TICK: Duration = Duration::from_millis(200);
const LEASE_WAIT_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub aircraft: usize,
    pub max_delay: u32,
    pub time_scale: f64,
    pub validity_secs: u64,
    pub operation_secs: u64,
}

impl SimulationOptions {
    fn scaled(&self, duration: Duration) -> Duration {
        duration.mul_f64(self.time_scale)
    }

    /// Pause before retrying a held request
    fn backoff(&self) -> Duration {
        self.scaled(BACKOFF_TICK * roll(self.max_delay))
    }

    /// Pause between receiving a lease and performing it. May overrun the
    /// validity window.
    fn lease_wait(&self) -> Duration {
        let bound = u32::try_from(self.validity_secs.saturating_mul(2)).unwrap_or(u32::MAX);
        self.scaled(LEASE_WAIT_TICK * roll(bound))
    }

    /// Time parked between landing and requesting take-off
    fn turnaround(&self) -> Duration {
        self.scaled(Duration::from_secs(self.operation_secs) + LEASE_WAIT_TICK * roll(self.max_delay))
    }
}

/// Uniform in `[0, bound)`, or 0 for an empty range.
fn roll(bound: u32) -> u32 {
    if bound == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..bound)
    }
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub aircraft: usize,
    pub elapsed_ms: u128,
    pub pool: PoolSnapshot,
    pub stats: BrokerStats,
}

#[derive(Debug, Clone, Copy)]
enum Leg {
    Landing,
    TakeOff,
}

impl std::fmt::Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Leg::Landing => write!(f, "landing"),
            Leg::TakeOff => write!(f, "take-off"),
        }
    }
}

pub async fn run(
    config: BrokerConfig,
    options: SimulationOptions,
) -> Result<SimulationReport, BrokerError> {
    let operation = config.operation_duration;
    let broker = Broker::new(config)?;
    let options = Arc::new(options);
    let started = Instant::now();

    tracing::info!(aircraft = options.aircraft, "Simulation starting");

    let mut fleet = JoinSet::new();
    for _ in 0..options.aircraft {
        fleet.spawn(fly(broker.clone(), Arc::clone(&options)));
    }

    while let Some(joined) = fleet.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                fleet.abort_all();
                return Err(e);
            }
            Err(e) => tracing::error!("Aircraft task failed: {}", e),
        }
    }

    // Let the last take-offs clear the runways before reporting.
    tokio::time::sleep(operation + Duration::from_millis(50)).await;

    tracing::info!("All done. Simulation terminating.");
    Ok(SimulationReport {
        aircraft: options.aircraft,
        elapsed_ms: started.elapsed().as_millis(),
        pool: broker.snapshot()?,
        stats: broker.stats()?,
    })
}

async fn fly(broker: Broker, options: Arc<SimulationOptions>) -> Result<(), BrokerError> {
    let aircraft = AircraftId::generate();

    tracing::info!(aircraft = %aircraft, "Attempting a landing");
    clear(
        &aircraft,
        Leg::Landing,
        &options,
        || broker.request_landing(&aircraft),
        |lease| broker.perform_landing(lease),
    )
    .await?;
    tracing::info!(aircraft = %aircraft, "Landed");

    tokio::time::sleep(options.turnaround()).await;

    tracing::info!(aircraft = %aircraft, "Attempting a take-off");
    clear(
        &aircraft,
        Leg::TakeOff,
        &options,
        || broker.request_take_off(&aircraft),
        |lease| broker.perform_take_off(lease),
    )
    .await?;
    tracing::info!(aircraft = %aircraft, "Departed");

    Ok(())
}

/// Runs request-then-perform until a perform succeeds.
async fn clear<L, R, P>(
    aircraft: &AircraftId,
    leg: Leg,
    options: &SimulationOptions,
    request: R,
    perform: P,
) -> Result<(), BrokerError>
where
    R: Fn() -> Result<RequestResult<L>, BrokerError>,
    P: Fn(L) -> Result<PerformResult, BrokerError>,
{
    loop {
        let lease = loop {
            match request()? {
                RequestResult::Proceed(lease) => break lease,
                RequestResult::Hold => tokio::time::sleep(options.backoff()).await,
            }
        };
        tracing::info!(aircraft = %aircraft, "Received a {} lease", leg);

        tokio::time::sleep(options.lease_wait()).await;

        match perform(lease)? {
            PerformResult::Success => return Ok(()),
            outcome => tracing::info!(
                aircraft = %aircraft,
                outcome = %outcome,
                "{} lease not honoured, trying again",
                leg
            ),
        }
    }
}
