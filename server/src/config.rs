//! Command-line settings.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use aqi::NegativePolicy;
use clap::Parser;

use crate::sensor::purpleair::DEFAULT_BASE_URL;

/// Gets sensor data from PurpleAir, converts it to AQI, and exports it to Prometheus.
#[derive(Parser, Debug)]
#[command(name = "purpleair-exporter", version)]
pub struct Args {
    /// Sensors to collect from (PurpleAir parent sensor IDs)
    #[arg(
        long,
        required = true,
        num_args = 1..,
        value_delimiter = ',',
        env = "PURPLEAIR_SENSOR_IDS"
    )]
    pub sensor_ids: Vec<String>,

    /// What port to serve Prometheus metrics on
    #[arg(long, default_value_t = 9760, env = "PURPLEAIR_PORT")]
    pub port: u16,

    /// How often to refresh, in seconds
    #[arg(
        long,
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..),
        env = "PURPLEAIR_REFRESH_SECONDS"
    )]
    pub refresh_seconds: u64,

    /// How long to wait for PurpleAir to answer, in seconds
    #[arg(
        long,
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..),
        env = "PURPLEAIR_TIMEOUT_SECONDS"
    )]
    pub timeout_seconds: u64,

    /// PurpleAir endpoint to poll
    #[arg(long, default_value = DEFAULT_BASE_URL, env = "PURPLEAIR_BASE_URL")]
    pub base_url: String,

    /// Convert negative corrected PM2.5 as-is (and skip it) instead of clamping to zero
    #[arg(long)]
    pub unclamped_corrections: bool,
}

/// Settings for running the exporter.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub sensor_ids: Vec<String>,
    /// Address the metrics endpoint listens on.
    pub listen: SocketAddr,
    /// Time between poll cycles.
    pub refresh: Duration,
    /// HTTP timeout for each PurpleAir request.
    pub timeout: Duration,
    pub base_url: String,
    pub negative_policy: NegativePolicy,
}

impl From<Args> for Settings {
    fn from(args: Args) -> Self {
        Settings {
            sensor_ids: args.sensor_ids,
            listen: SocketAddr::from((Ipv4Addr::UNSPECIFIED, args.port)),
            refresh: Duration::from_secs(args.refresh_seconds),
            timeout: Duration::from_secs(args.timeout_seconds),
            base_url: args.base_url,
            negative_policy: if args.unclamped_corrections {
                NegativePolicy::Passthrough
            } else {
                NegativePolicy::ClampToZero
            },
        }
    }
}
