//! Demo of reading PurpleAir sensors: fetch once and print what we'd publish.

use std::time::Duration;

use aqi::{to_iaqi, Algorithm, Category, Correction, Pollutant};
use clap::Parser;
use purpleair_exporter::sensor::{
    purpleair::{PurpleAir, DEFAULT_BASE_URL},
    SensorReading, SensorSource,
};

/// Fetch PurpleAir sensor groups once and print their readings.
#[derive(Parser, Debug)]
#[command(name = "purpleair-fetch")]
struct Args {
    /// Parent sensor IDs to fetch
    #[arg(required = true)]
    sensor_ids: Vec<String>,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// How long to wait for PurpleAir to answer, in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_seconds: u64,
}

fn print_aqi(label: &str, concentration: f64) {
    match to_iaqi(Pollutant::Pm25, concentration, Algorithm::Epa) {
        Ok(index) => println!(
            "  {:<10} {:>4.0} ({}) from {:.1} µg/m³",
            label,
            index,
            Category::from_index(index),
            concentration
        ),
        Err(e) => println!("  {:<10} {}", label, e),
    }
}

fn print_reading(r: &SensorReading) {
    println!("{} ({})", r.name, r.sensor_id);
    if let Some(t) = r.last_seen {
        println!("  last seen  {}", t);
    }
    match r.pm25_10m {
        Some(raw) => {
            print_aqi("AQI", raw);
            for correction in Correction::ALL {
                print_aqi(&format!("{}", correction), correction.apply(raw));
            }
        }
        None => println!("  no PM2.5 reading"),
    }
    for (label, value, unit) in [
        ("temp", r.temp_f, "°F"),
        ("humidity", r.humidity, "%"),
        ("pressure", r.pressure, "mb"),
    ] {
        if let Some(v) = value {
            println!("  {:<10} {:.1}{}", label, v, unit);
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut client = PurpleAir::new(&args.base_url, Duration::from_secs(args.timeout_seconds))?;
    for id in &args.sensor_ids {
        println!("== sensor group {}", id);
        match client.fetch(id) {
            Ok(readings) => readings.iter().for_each(print_reading),
            Err(e) => println!("error: {}", e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_timeout() {
        Args::try_parse_from(["purpleair-fetch", "1", "--timeout-seconds", "0"])
            .expect_err("zero timeout");
        let args = Args::try_parse_from(["purpleair-fetch", "1", "2"]).expect("should parse");
        assert_eq!(args.sensor_ids, vec!["1", "2"]);
        assert_eq!(args.timeout_seconds, 10);
    }
}
