//! Print the AQI for PM2.5 concentrations given on the command line.
//!
//! ```text
//! aqi-calc 8.2 35.4 151
//! ```

use aqi::{to_iaqi, Algorithm, Category, Correction, Pollutant};

fn describe(concentration: f64) -> String {
    match to_iaqi(Pollutant::Pm25, concentration, Algorithm::Epa) {
        Ok(index) => format!("{:>5.0} ({})", index, Category::from_index(index)),
        Err(e) => format!("error: {}", e),
    }
}

fn main() {
    let mut any = false;
    for arg in std::env::args().skip(1) {
        any = true;
        let raw: f64 = match arg.parse() {
            Ok(v) => v,
            Err(e) => {
                println!("{arg}: not a number: {e}");
                continue;
            }
        };
        println!("PM2.5 {:.1} µg/m³", raw);
        println!("  EPA:     {}", describe(raw));
        for correction in Correction::ALL {
            let corrected = correction.apply(raw);
            println!(
                "  {:<8} {} from {:.2} µg/m³",
                format!("{}:", correction),
                describe(corrected),
                corrected
            );
        }
    }
    if !any {
        println!("usage: aqi-calc <pm2.5 µg/m³>...");
    }
}
