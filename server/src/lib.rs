//! Prometheus exporter for PurpleAir air quality sensors.
//!
//! Polls PurpleAir's JSON endpoint for a list of sensor groups, converts the
//! 10-minute PM2.5 average to an EPA AQI (raw, and with the AQandU and LRAPA
//! corrections), and publishes these gauges on `/metrics`:
//!
//! * `purpleair_pm_25_10m_iaqi`
//! * `purpleair_pm_25_10m_iaqi_AQandU`
//! * `purpleair_pm_25_10m_iaqi_LRAPA`
//! * `purpleair_temp_f`
//! * `purpleair_humidity_pct`
//! * `purpleair_pressure_mb`
//!
//! each labeled `{parent_sensor_id, sensor_id, sensor_name}`.
//!
//! Gauges keep their last value: a reading that is missing a field, or a
//! group that fails to fetch, leaves the previous values in place.

use std::time::Duration;

use aqi::{Algorithm, Correction, NegativePolicy, Pollutant};

pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod sensor;
pub mod web;

use context::Context;
use error::Result;
use metrics::{Gauge, Labels, Metrics};
use sensor::{SensorReading, SensorSource};

/// Outcome of one pass over all sensor groups.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Groups fetched successfully.
    pub groups: usize,
    /// Readings published across those groups.
    pub readings: usize,
    /// The group whose failure cut the cycle short, if any.
    pub failed: Option<String>,
}

/// Drives a sensor source into the metrics registry.
pub struct Poller<S> {
    source: S,
    metrics: Metrics,
    negative_policy: NegativePolicy,
}

impl<S: SensorSource> Poller<S> {
    pub fn new(source: S, metrics: Metrics, negative_policy: NegativePolicy) -> Self {
        Poller {
            source,
            metrics,
            negative_policy,
        }
    }

    #[cfg(test)]
    fn source(&self) -> &S {
        &self.source
    }

    /// Fetch one sensor group and publish its readings.
    /// Returns how many readings were published.
    pub fn poll_group(&mut self, parent_sensor_id: &str) -> Result<usize> {
        let readings = self.source.fetch(parent_sensor_id)?;
        for reading in &readings {
            self.publish(parent_sensor_id, reading);
        }
        Ok(readings.len())
    }

    /// Poll each group in turn. The first failure skips the rest of the cycle.
    pub fn poll_cycle(&mut self, parent_sensor_ids: &[String]) -> CycleReport {
        let mut report = CycleReport::default();
        for id in parent_sensor_ids {
            match self.poll_group(id) {
                Ok(n) => {
                    report.groups += 1;
                    report.readings += n;
                }
                Err(e) => {
                    tracing::error!("{}; skipping rest of poll", e);
                    report.failed = Some(id.clone());
                    break;
                }
            }
        }
        report
    }

    /// Poll every `interval` until the context is cancelled.
    pub fn run(&mut self, parent_sensor_ids: &[String], interval: Duration, ctx: &Context) {
        while !ctx.is_cancelled() {
            tracing::info!("refreshing {} sensor groups", parent_sensor_ids.len());
            let report = self.poll_cycle(parent_sensor_ids);
            tracing::info!(
                groups = report.groups,
                readings = report.readings,
                "poll complete"
            );
            ctx.wait_timeout(interval);
        }
    }

    fn publish(&self, parent_sensor_id: &str, reading: &SensorReading) {
        let labels = Labels {
            parent_sensor_id,
            sensor_id: &reading.sensor_id,
            sensor_name: &reading.name,
        };
        tracing::debug!(
            parent_sensor_id,
            sensor_id = %reading.sensor_id,
            last_seen = ?reading.last_seen,
            pm25_10m = ?reading.pm25_10m,
            "publishing reading"
        );

        if let Some(raw) = reading.pm25_10m {
            self.publish_aqi(Gauge::Aqi, &labels, raw);
            for correction in Correction::ALL {
                let corrected = correction.apply_with(raw, self.negative_policy);
                self.publish_aqi(Gauge::corrected(correction), &labels, corrected);
            }
        }

        let plain = [
            (Gauge::TempF, reading.temp_f),
            (Gauge::HumidityPct, reading.humidity),
            (Gauge::PressureMb, reading.pressure),
        ];
        for (gauge, value) in plain {
            if let Some(v) = value {
                self.metrics.set_gauge(gauge, &labels, v);
            }
        }
    }

    fn publish_aqi(&self, gauge: Gauge, labels: &Labels, concentration: f64) {
        match aqi::to_iaqi(Pollutant::Pm25, concentration, Algorithm::Epa) {
            Ok(index) => self.metrics.set_gauge(gauge, labels, index),
            Err(e) => tracing::warn!(
                sensor_id = labels.sensor_id,
                gauge = gauge.name(),
                "not updating: {}",
                e
            ),
        }
    }
}
