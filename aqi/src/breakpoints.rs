//! EPA breakpoint tables.
//!
//! Values are from the EPA's
//! [Technical Assistance Document for the Reporting of Daily Air Quality](https://www.airnow.gov/sites/default/files/2020-05/aqi-technical-assistance-document-sept2018.pdf),
//! table 5.

/// One row of a breakpoint table: a closed concentration range
/// and the index range it maps onto.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Breakpoint {
    pub concentration_low: f64,
    pub concentration_high: f64,
    pub index_low: f64,
    pub index_high: f64,
}

const fn row(concentration_low: f64, concentration_high: f64, index_low: f64, index_high: f64) -> Breakpoint {
    Breakpoint {
        concentration_low,
        concentration_high,
        index_low,
        index_high,
    }
}

/// A piecewise-linear mapping from concentration to index.
///
/// Rows are ordered and contiguous at the table's reporting precision:
/// each row starts one reporting step above the previous row's end.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BreakpointTable {
    rows: &'static [Breakpoint],
    /// Number of decimal places concentrations are reported at.
    decimals: u8,
}

impl BreakpointTable {
    /// The rows of this table, lowest category first.
    pub fn rows(&self) -> &'static [Breakpoint] {
        self.rows
    }

    /// Lowest concentration covered by the table.
    pub fn min(&self) -> f64 {
        self.rows[0].concentration_low
    }

    /// Highest concentration covered by the table.
    pub fn max(&self) -> f64 {
        self.rows[self.rows.len() - 1].concentration_high
    }

    /// Truncate a concentration to the table's reporting precision.
    ///
    /// The EPA procedure truncates rather than rounds; e.g. 12.09 µg/m³ of
    /// PM2.5 is reported as 12.0.
    pub fn truncate(&self, concentration: f64) -> f64 {
        let scale = 10f64.powi(self.decimals as i32);
        // A tiny nudge keeps values like 35.4 (354 * 0.1 in binary) from
        // landing just below their own tenth.
        (concentration * scale + 1e-9).floor() / scale
    }

    /// The row containing an already-truncated concentration.
    /// Boundaries resolve to the higher row.
    pub(crate) fn find(&self, concentration: f64) -> Option<&'static Breakpoint> {
        self.rows.iter().rev().find(|bp| {
            concentration >= bp.concentration_low && concentration <= bp.concentration_high
        })
    }
}

/// PM2.5, 24-hour average, µg/m³.
pub const PM25: BreakpointTable = BreakpointTable {
    rows: &[
        row(0.0, 12.0, 0.0, 50.0),
        row(12.1, 35.4, 51.0, 100.0),
        row(35.5, 55.4, 101.0, 150.0),
        row(55.5, 150.4, 151.0, 200.0),
        row(150.5, 250.4, 201.0, 300.0),
        row(250.5, 350.4, 301.0, 400.0),
        row(350.5, 500.4, 401.0, 500.0),
    ],
    decimals: 1,
};

/// PM10, 24-hour average, µg/m³.
pub const PM10: BreakpointTable = BreakpointTable {
    rows: &[
        row(0.0, 54.0, 0.0, 50.0),
        row(55.0, 154.0, 51.0, 100.0),
        row(155.0, 254.0, 101.0, 150.0),
        row(255.0, 354.0, 151.0, 200.0),
        row(355.0, 424.0, 201.0, 300.0),
        row(425.0, 504.0, 301.0, 400.0),
        row(505.0, 604.0, 401.0, 500.0),
    ],
    decimals: 0,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Each row must start exactly one reporting step above the previous one.
    fn assert_contiguous(table: &BreakpointTable, step: f64) {
        for pair in table.rows().windows(2) {
            let gap = pair[1].concentration_low - pair[0].concentration_high;
            assert!(
                (gap - step).abs() < 1e-9,
                "gap of {gap} between {:?} and {:?}",
                pair[0],
                pair[1]
            );
            assert_eq!(pair[1].index_low, pair[0].index_high + 1.0);
        }
    }

    #[test]
    fn tables_are_contiguous() {
        assert_contiguous(&PM25, 0.1);
        assert_contiguous(&PM10, 1.0);
    }

    #[test]
    fn truncates_to_precision() {
        assert_eq!(PM25.truncate(12.09), 12.0);
        assert_eq!(PM25.truncate(35.4), 35.4);
        assert_eq!(PM25.truncate(12.1), 12.1);
        assert_eq!(PM10.truncate(54.9), 54.0);
    }

    #[test]
    fn every_truncated_value_has_a_row() {
        // Walk the PM2.5 domain in reporting steps; nothing may fall in a gap.
        for tenths in 0..=5004 {
            let c = PM25.truncate(tenths as f64 / 10.0);
            assert!(PM25.find(c).is_some(), "no row for {c}");
        }
    }
}
