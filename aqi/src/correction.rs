//! Calibration corrections for PurpleAir PM2.5 readings.
//!
//! The laser counters in PurpleAir sensors over-report PM2.5 relative to
//! reference monitors. These linear fits map a raw reading onto a corrected
//! concentration, which is then converted like any other.

/// What to do with a correction that comes out below zero.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum NegativePolicy {
    /// Report zero concentration.
    #[default]
    ClampToZero,
    /// Keep the negative value; conversion will reject it as out of range.
    Passthrough,
}

/// A named linear correction over raw PM2.5 (µg/m³).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Correction {
    /// University of Utah fit: `0.778 * raw + 2.65`.
    AQandU,
    /// Lane Regional Air Protection Agency fit: `0.5 * raw - 0.66`.
    Lrapa,
}

impl Correction {
    /// Both corrections, in the order they are usually reported.
    pub const ALL: [Correction; 2] = [Correction::AQandU, Correction::Lrapa];

    /// Apply the correction, clamping negative results to zero.
    pub fn apply(self, raw: f64) -> f64 {
        self.apply_with(raw, NegativePolicy::ClampToZero)
    }

    /// Apply the correction with an explicit policy for negative results.
    pub fn apply_with(self, raw: f64, policy: NegativePolicy) -> f64 {
        let (slope, intercept) = match self {
            Correction::AQandU => (0.778, 2.65),
            Correction::Lrapa => (0.5, -0.66),
        };
        let corrected = slope * raw + intercept;
        match policy {
            NegativePolicy::ClampToZero => corrected.max(0.0),
            NegativePolicy::Passthrough => corrected,
        }
    }

    /// Short name, as used in metric names.
    pub fn name(self) -> &'static str {
        match self {
            Correction::AQandU => "AQandU",
            Correction::Lrapa => "LRAPA",
        }
    }
}

impl core::fmt::Display for Correction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// AQandU-corrected PM2.5; negative results clamp to zero.
pub fn aqandu(raw: f64) -> f64 {
    Correction::AQandU.apply(raw)
}

/// LRAPA-corrected PM2.5; negative results clamp to zero.
pub fn lrapa(raw: f64) -> f64 {
    Correction::Lrapa.apply(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn aqandu_fit() {
        assert_close(aqandu(10.0), 10.43);
        assert_close(aqandu(0.0), 2.65);
    }

    #[test]
    fn lrapa_fit() {
        assert_close(lrapa(10.0), 4.34);
    }

    #[test]
    fn lrapa_clamps_low_readings() {
        // 0.5 * 1.0 - 0.66 = -0.16
        assert_eq!(lrapa(1.0), 0.0);
        assert_close(
            Correction::Lrapa.apply_with(1.0, NegativePolicy::Passthrough),
            -0.16,
        );
    }

    #[test]
    fn names() {
        assert_eq!(Correction::AQandU.to_string(), "AQandU");
        assert_eq!(Correction::Lrapa.to_string(), "LRAPA");
    }
}
