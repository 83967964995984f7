//! Gauges published to Prometheus.

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use aqi::Correction;

/// Label names shared by every gauge.
const LABELS: [&str; 3] = ["parent_sensor_id", "sensor_id", "sensor_name"];

/// The quantities we publish per sensor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Gauge {
    Aqi,
    AqiAQandU,
    AqiLrapa,
    TempF,
    HumidityPct,
    PressureMb,
}

impl Gauge {
    pub const ALL: [Gauge; 6] = [
        Gauge::Aqi,
        Gauge::AqiAQandU,
        Gauge::AqiLrapa,
        Gauge::TempF,
        Gauge::HumidityPct,
        Gauge::PressureMb,
    ];

    /// The AQI gauge for a corrected concentration.
    pub fn corrected(correction: Correction) -> Gauge {
        match correction {
            Correction::AQandU => Gauge::AqiAQandU,
            Correction::Lrapa => Gauge::AqiLrapa,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Gauge::Aqi => "purpleair_pm_25_10m_iaqi",
            Gauge::AqiAQandU => "purpleair_pm_25_10m_iaqi_AQandU",
            Gauge::AqiLrapa => "purpleair_pm_25_10m_iaqi_LRAPA",
            Gauge::TempF => "purpleair_temp_f",
            Gauge::HumidityPct => "purpleair_humidity_pct",
            Gauge::PressureMb => "purpleair_pressure_mb",
        }
    }

    fn help(self) -> &'static str {
        match self {
            Gauge::Aqi => "iAQI (10 min average)",
            Gauge::AqiAQandU => "iAQI (10 min average) with the AQandU correction",
            Gauge::AqiLrapa => "iAQI (10 min average) with the LRAPA correction",
            Gauge::TempF => "Sensor temp reading (degrees Fahrenheit)",
            Gauge::HumidityPct => "Sensor humidity reading (percent)",
            Gauge::PressureMb => "Sensor pressure reading (Millibars)",
        }
    }
}

/// Label values identifying one sensor channel.
#[derive(Debug, Copy, Clone)]
pub struct Labels<'a> {
    pub parent_sensor_id: &'a str,
    pub sensor_id: &'a str,
    pub sensor_name: &'a str,
}

impl Labels<'_> {
    fn values(&self) -> [&str; 3] {
        [self.parent_sensor_id, self.sensor_id, self.sensor_name]
    }
}

/// A registry holding every gauge we publish.
///
/// Clones share the same underlying values, so one handle can be written by
/// the poll loop while another is scraped.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    gauges: Vec<GaugeVec>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let gauges = Gauge::ALL
            .iter()
            .map(|g| {
                // Names, help text and labels are all static and distinct.
                let vec = GaugeVec::new(Opts::new(g.name(), g.help()), &LABELS)
                    .expect("gauge definition should be valid");
                registry
                    .register(Box::new(vec.clone()))
                    .expect("gauge should register once");
                vec
            })
            .collect();
        Metrics { registry, gauges }
    }

    fn vec(&self, gauge: Gauge) -> &GaugeVec {
        // `gauges` is built in `Gauge::ALL` order, which is declaration order.
        &self.gauges[gauge as usize]
    }

    /// Set a gauge for one sensor, replacing any previous value.
    pub fn set_gauge(&self, gauge: Gauge, labels: &Labels, value: f64) {
        self.vec(gauge).with_label_values(&labels.values()).set(value);
    }

    /// The current value of a gauge, if it has ever been set for these labels.
    pub fn gauge_value(&self, gauge: Gauge, labels: &Labels) -> Option<f64> {
        let want = labels.values();
        self.registry
            .gather()
            .iter()
            .filter(|family| family.get_name() == gauge.name())
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                LABELS.iter().zip(want).all(|(name, value)| {
                    metric
                        .get_label()
                        .iter()
                        .any(|l| l.get_name() == *name && l.get_value() == value)
                })
            })
            .map(|metric| metric.get_gauge().get_value())
    }

    /// Encode every gauge in the Prometheus text exposition format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
