//! Air Quality Index computation.
//!
//! Converts pollutant concentrations to the US EPA's AQI by linear
//! interpolation over the published breakpoint tables, and provides the
//! calibration corrections commonly applied to PurpleAir PM2.5 readings.
//!
//! ```
//! use aqi::{to_iaqi, Algorithm, Pollutant};
//!
//! let index = to_iaqi(Pollutant::Pm25, 35.4, Algorithm::Epa).unwrap();
//! assert_eq!(index, 100.0);
//! ```

pub mod breakpoints;
pub mod correction;

pub use breakpoints::{Breakpoint, BreakpointTable};
pub use correction::{aqandu, lrapa, Correction, NegativePolicy};

/// An error in computing an index.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Error {
    /// The concentration is not covered by the breakpoint table.
    OutOfRange { concentration: f64, min: f64, max: f64 },
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::OutOfRange {
                concentration,
                min,
                max,
            } => write!(
                f,
                "concentration {} is outside the breakpoint table [{}, {}]",
                concentration, min, max
            ),
        }
    }
}

impl core::error::Error for Error {}

/// Pollutants with a breakpoint table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Pollutant {
    /// Fine particulate matter, ≤2.5µm, in µg/m³.
    Pm25,
    /// Coarse particulate matter, ≤10µm, in µg/m³.
    Pm10,
}

/// Index algorithms.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Algorithm {
    /// US Environmental Protection Agency AQI.
    #[default]
    Epa,
}

impl Pollutant {
    /// The breakpoint table for this pollutant under the given algorithm.
    pub fn table(self, algorithm: Algorithm) -> &'static BreakpointTable {
        match (self, algorithm) {
            (Pollutant::Pm25, Algorithm::Epa) => &breakpoints::PM25,
            (Pollutant::Pm10, Algorithm::Epa) => &breakpoints::PM10,
        }
    }
}

/// Convert a concentration to an index using the given table.
///
/// The concentration is truncated to the table's reporting precision, then
/// interpolated within the row that contains it. The result is not rounded.
pub fn convert(concentration: f64, table: &BreakpointTable) -> Result<f64, Error> {
    let out_of_range = Error::OutOfRange {
        concentration,
        min: table.min(),
        max: table.max(),
    };
    if !concentration.is_finite() || concentration < table.min() {
        return Err(out_of_range);
    }

    let c = table.truncate(concentration);
    let bp = table.find(c).ok_or(out_of_range)?;

    // Bounds map exactly; don't let interpolation rounding nudge them.
    if c == bp.concentration_low {
        return Ok(bp.index_low);
    }
    if c == bp.concentration_high {
        return Ok(bp.index_high);
    }

    Ok((bp.index_high - bp.index_low) / (bp.concentration_high - bp.concentration_low)
        * (c - bp.concentration_low)
        + bp.index_low)
}

/// Individual AQI for a pollutant concentration.
pub fn to_iaqi(pollutant: Pollutant, concentration: f64, algorithm: Algorithm) -> Result<f64, Error> {
    convert(concentration, pollutant.table(algorithm))
}

/// EPA AQI categories.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl Category {
    /// The category an index value falls in.
    ///
    /// Index values above 500 are still Hazardous.
    pub fn from_index(index: f64) -> Category {
        // Indices between categories (e.g. 50.5) belong to the lower one;
        // published indices are integers.
        match index {
            i if i < 51.0 => Category::Good,
            i if i < 101.0 => Category::Moderate,
            i if i < 151.0 => Category::UnhealthyForSensitiveGroups,
            i if i < 201.0 => Category::Unhealthy,
            i if i < 301.0 => Category::VeryUnhealthy,
            _ => Category::Hazardous,
        }
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Category::Good => "Good",
            Category::Moderate => "Moderate",
            Category::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            Category::Unhealthy => "Unhealthy",
            Category::VeryUnhealthy => "Very Unhealthy",
            Category::Hazardous => "Hazardous",
        };
        f.write_str(s)
    }
}
