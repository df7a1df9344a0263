use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::error;
use tracing_subscriber::EnvFilter;

use rail_traffic::client::TrafficClient;
use rail_traffic::config::{
    DEFAULT_BASE_URL, DEFAULT_MAX_CONCURRENT, DEFAULT_TIMEOUT_SECS, TrafficConfig,
};
use rail_traffic::upstream::{HttpGateway, UpstreamError};

/// Query the ViaggiaTreno traffic service and print the results as JSON.
///
/// Logs go to stderr (filter with RUST_LOG, default: info).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Service base URL
    #[arg(long, env = "RAIL_TRAFFIC_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Concurrent per-segment requests when aggregating trains
    #[arg(long, env = "RAIL_TRAFFIC_MAX_CONCURRENT", default_value_t = DEFAULT_MAX_CONCURRENT)]
    max_concurrent: usize,

    /// Request timeout in seconds
    #[arg(long, env = "RAIL_TRAFFIC_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(clap::Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Station catalog
    Stations,
    /// Segment list
    Segments {
        /// One record per segment id pair
        #[arg(long)]
        unique: bool,
        /// Only segments reported as occupied
        #[arg(long)]
        busy: bool,
    },
    /// Every train on the network, deduplicated
    Trains,
    /// Region id of a station
    Region { station_id: String },
    /// Candidate trains for a number
    Find { query: String },
    /// Stop list of a train
    Stops {
        number: u32,
        /// Departure station; looked up by number when omitted
        station_id: Option<String>,
    },
    /// Full itinerary with current stop
    Progress {
        number: u32,
        /// Departure station; looked up by number when omitted
        station_id: Option<String>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = match TrafficClient::from_config(args.config()) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to create HTTP client");
            return ExitCode::FAILURE;
        }
    };

    match args.cmd.run(&client).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

impl Args {
    fn config(&self) -> TrafficConfig {
        TrafficConfig::new()
            .with_base_url(&self.base_url)
            .with_max_concurrent(self.max_concurrent)
            .with_timeout(self.timeout_secs)
    }
}

impl Command {
    async fn run(&self, client: &TrafficClient<HttpGateway>) -> Result<(), CliError> {
        let stdout = std::io::stdout().lock();

        match self {
            Command::Stations => write_json(stdout, &client.fetch_stations().await?),
            Command::Segments { unique, busy } => {
                write_json(stdout, &client.fetch_segments(*unique, *busy).await?)
            }
            Command::Trains => write_json(stdout, &client.fetch_all_trains().await?),
            Command::Region { station_id } => {
                write_json(stdout, &client.region_id_for_station(station_id).await?)
            }
            Command::Find { query } => write_json(stdout, &client.autocomplete(query).await?),
            Command::Stops { number, station_id } => write_json(
                stdout,
                &client
                    .fetch_stop_info(*number, station_id.as_deref(), 0)
                    .await?,
            ),
            Command::Progress { number, station_id } => write_json(
                stdout,
                &client
                    .fetch_train_info(*number, station_id.as_deref(), 0)
                    .await?,
            ),
        }
    }
}

/// Pretty-print `value` as one JSON document followed by a newline.
fn write_json<W: Write, T: Serialize>(mut out: W, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
