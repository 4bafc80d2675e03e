//! leafling-uptime - periodic health ping utility
//!
//! Keeps a free-tier deployment awake by pinging the health endpoint on a
//! fixed interval, and logs the outcome of every ping.

use clap::Parser;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

const INTERVAL_MINUTES: u64 = 14;

#[derive(Debug, Parser)]
#[command(name = "leafling-uptime", about = "Ping a health endpoint on an interval")]
struct Args {
    /// Target URL to ping
    #[arg(env = "SERVER_URL", default_value = "http://localhost:3000/health")]
    target: String,
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    info!("Starting uptime bot");
    info!("Target: {}", args.target);
    info!("Interval: {} minutes", INTERVAL_MINUTES);

    let client = reqwest::Client::new();
    let mut interval = tokio::time::interval(Duration::from_secs(INTERVAL_MINUTES * 60));

    loop {
        // First tick fires immediately, so the initial ping is not delayed
        interval.tick().await;

        match client.get(&args.target).send().await {
            Ok(response) => {
                info!("Ping successful: {}", response.status());
            }
            Err(e) => {
                error!("Ping failed: {}", e);
            }
        }
    }
}
