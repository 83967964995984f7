//! Types for surfacing sensor readings.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

pub mod purpleair;

/// One physical sensor's values, as reported in a single poll.
///
/// A PurpleAir station ("parent sensor") usually reports two of these,
/// one per laser counter channel. Any measurement may be missing.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct SensorReading {
    /// Identifier of this channel.
    pub sensor_id: String,

    /// Display name set by the sensor's owner.
    pub name: String,

    /// When the sensor last reported to PurpleAir.
    pub last_seen: Option<DateTime<Utc>>,

    /// PM2.5 concentration, 10-minute average, in µg/m³.
    pub pm25_10m: Option<f64>,

    /// Temperature in degrees Fahrenheit.
    pub temp_f: Option<f64>,

    /// Relative humidity as a percentage (i.e. range 0.0 to 100.0).
    pub humidity: Option<f64>,

    /// Pressure in millibars.
    pub pressure: Option<f64>,
}

/// A type that can get the current readings for a sensor group.
pub trait SensorSource {
    /// Get the latest readings for every sensor under `parent_sensor_id`.
    fn fetch(&mut self, parent_sensor_id: &str) -> Result<Vec<SensorReading>>;
}

/// Fake sensor source: serves canned readings and records what was asked for.
#[derive(Default, Debug)]
pub struct FakeSensorSource {
    pub readings: HashMap<String, Vec<SensorReading>>,
    /// Groups that fail as if PurpleAir returned a server error.
    pub failing: HashSet<String>,
    /// Every group fetched, in order.
    pub requests: Vec<String>,
}

impl SensorSource for FakeSensorSource {
    fn fetch(&mut self, parent_sensor_id: &str) -> Result<Vec<SensorReading>> {
        self.requests.push(parent_sensor_id.to_owned());
        if self.failing.contains(parent_sensor_id) {
            return Err(Error::Status {
                sensor_id: parent_sensor_id.to_owned(),
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            });
        }
        Ok(self
            .readings
            .get(parent_sensor_id)
            .cloned()
            .unwrap_or_default())
    }
}
