mod handlers;
mod server;
mod simulate;


use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tarmac_core::BrokerConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tarmac",
    about = "Tarmac — lease-based admission control for runways and parking stands",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Broker pool and lease parameters shared by every subcommand
#[derive(Args, Clone, Debug)]
struct PoolArgs {
    /// Number of runways
    #[arg(long, default_value = "5", env = "TARMAC_RUNWAYS")]
    runways: usize,

    /// Number of parking stands
    #[arg(long, default_value = "10", env = "TARMAC_STANDS")]
    stands: usize,

    /// Seconds a runway stays in operation per landing or take-off
    #[arg(long, default_value = "5", env = "TARMAC_OPERATION_SECS")]
    operation_secs: u64,

    /// Seconds a granted lease stays valid
    #[arg(long, default_value = "2", env = "TARMAC_VALIDITY_SECS")]
    validity_secs: u64,
}

impl PoolArgs {
    fn config(&self, time_scale: f64) -> BrokerConfig {
        BrokerConfig::new(
            self.runways,
            self.stands,
            Duration::from_secs(self.operation_secs).mul_f64(time_scale),
            Duration::from_secs(self.validity_secs).mul_f64(time_scale),
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP broker server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3200")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Bearer token required on every route but /health
        #[arg(long, env = "TARMAC_API_KEY")]
        api_key: Option<String>,

        #[command(flatten)]
        pool: PoolArgs,
    },

    /// Fly a fleet of simulated aircraft through land/take-off cycles
    Simulate {
        /// Number of simulated aircraft
        #[arg(long, default_value = "30")]
        aircraft: usize,

        /// Upper bound (exclusive) on random delay multipliers
        #[arg(long, default_value = "5")]
        max_delay: u32,

        /// Multiplier applied to every delay and duration; 0.1 runs ten times faster
        #[arg(long, default_value = "1.0")]
        time_scale: f64,

        #[command(flatten)]
        pool: PoolArgs,
    },

    /// Print version information
    Version,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            port,
            host,
            api_key,
            pool,
        } => server::run(&host, port, pool.config(1.0), api_key).await,
        Commands::Simulate {
            aircraft,
            max_delay,
            time_scale,
            pool,
        } => run_simulation(aircraft, max_delay, time_scale, pool).await,
        Commands::Version => {
            println!("tarmac {}", env!("CARGO_PKG_VERSION"));
            println!("Lease-based admission control for runways and parking stands");
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run_simulation(
    aircraft: usize,
    max_delay: u32,
    time_scale: f64,
    pool: PoolArgs,
) -> Result<(), String> {
    if !time_scale.is_finite() || time_scale <= 0.0 {
        return Err(format!("time_scale must be a positive number, got {}", time_scale));
    }

    let options = simulate::SimulationOptions {
        aircraft,
        max_delay,
        time_scale,
        validity_secs: pool.validity_secs,
        operation_secs: pool.operation_secs,
    };

    let report = simulate::run(pool.config(time_scale), options)
        .await
        .map_err(|e| e.to_string())?;

    let rendered = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
    println!("{}", rendered);
    Ok(())
}
