//! Get sensor data from PurpleAir's public JSON endpoint.
//!
//! `GET /json?show=<parent sensor id>` returns `.results[]`, one entry per
//! channel of the station:
//!
//! - `.ID`, `.Label`: channel ID and display name
//! - `.Stats`: a *string* holding more JSON, with PM2.5 averages:
//!   `v` (current), `v1` (10 minute), `v2` (30 minute), `v3` (1 hour), ...
//! - `.temp_f`, `.humidity`, `.pressure`: usually strings, e.g. `"1011.23"`;
//!   only present on the primary channel
//! - `.LastSeen`: Unix timestamp of the last report

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{SensorReading, SensorSource};
use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://www.purpleair.com";

const USER_AGENT: &str = concat!("purpleair-exporter/", env!("CARGO_PKG_VERSION"));

/// Client for the PurpleAir JSON endpoint.
pub struct PurpleAir {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl PurpleAir {
    /// Create a client for the endpoint at `base_url`.
    /// Requests that take longer than `timeout` fail.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(Error::Client)?;
        Ok(PurpleAir {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }
}

impl SensorSource for PurpleAir {
    fn fetch(&mut self, parent_sensor_id: &str) -> Result<Vec<SensorReading>> {
        let request_error = |source| Error::Request {
            sensor_id: parent_sensor_id.to_owned(),
            source,
        };

        let resp = self
            .client
            .get(format!("{}/json", self.base_url))
            .query(&[("show", parent_sensor_id)])
            .send()
            .map_err(request_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                sensor_id: parent_sensor_id.to_owned(),
                status,
            });
        }

        let body = resp.text().map_err(request_error)?;
        parse_response(&body).map_err(|source| Error::Parse {
            sensor_id: parent_sensor_id.to_owned(),
            source,
        })
    }
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    results: Vec<RawSensor>,
}

// Every per-sensor field is read as a raw `Value` so one odd field costs
// only that field, never the whole group.
#[derive(Deserialize)]
struct RawSensor {
    #[serde(rename = "ID")]
    id: Option<Value>,
    #[serde(rename = "Label")]
    label: Option<Value>,
    #[serde(rename = "Stats")]
    stats: Option<Value>,
    #[serde(rename = "LastSeen")]
    last_seen: Option<Value>,
    temp_f: Option<Value>,
    humidity: Option<Value>,
    pressure: Option<Value>,
}

#[derive(Deserialize)]
struct Stats {
    v1: Option<f64>,
}

/// Parse a `/json` response body into readings.
pub fn parse_response(body: &str) -> serde_json::Result<Vec<SensorReading>> {
    let resp: Response = serde_json::from_str(body)?;
    Ok(resp.results.into_iter().map(RawSensor::into_reading).collect())
}

/// A number that may arrive as a JSON number or a numeric string.
/// Anything else is treated as absent.
fn numeric(sensor_id: &str, field: &str, value: Option<Value>) -> Option<f64> {
    match value? {
        Value::Null => None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.trim() {
            "" => None,
            t => t.parse().ok().or_else(|| {
                tracing::warn!(sensor_id, field, "ignoring non-numeric value {:?}", s);
                None
            }),
        },
        other => {
            tracing::warn!(sensor_id, field, "ignoring unexpected value {}", other);
            None
        }
    }
}

impl RawSensor {
    fn into_reading(self) -> SensorReading {
        let sensor_id = match self.id {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(v) => v.to_string(),
        };
        let name = match self.label {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(v) => v.to_string(),
        };
        let id = sensor_id.as_str();
        SensorReading {
            name,
            last_seen: numeric(id, "LastSeen", self.last_seen)
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs as i64, 0)),
            pm25_10m: self.stats.and_then(|stats| pm25_10m(id, stats)),
            temp_f: numeric(id, "temp_f", self.temp_f),
            humidity: numeric(id, "humidity", self.humidity),
            pressure: numeric(id, "pressure", self.pressure),
            sensor_id,
        }
    }
}

/// Pull the 10-minute PM2.5 average out of a `Stats` payload.
/// A malformed payload only costs this one value.
fn pm25_10m(sensor_id: &str, stats: Value) -> Option<f64> {
    let parsed = match stats {
        Value::String(s) => serde_json::from_str::<Stats>(&s),
        Value::Null => return None,
        v => serde_json::from_value::<Stats>(v),
    };
    match parsed {
        Ok(stats) => stats.v1,
        Err(e) => {
            tracing::warn!(sensor_id, "ignoring malformed stats: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;

    const STATION: &str = r#"{
        "mapVersion": "0.22",
        "results": [
            {
                "ID": 12345,
                "Label": "Back Yard",
                "LastSeen": 1600000000,
                "Stats": "{\"v\":9.5,\"v1\":10.0,\"v2\":11.2,\"v3\":12.9}",
                "temp_f": "79",
                "humidity": "28",
                "pressure": "1011.23"
            },
            {
                "ID": 12346,
                "ParentID": 12345,
                "Label": "Back Yard B",
                "Stats": "{\"v\":9.1,\"v1\":9.8}"
            }
        ]
    }"#;

    #[test]
    fn parse_station() {
        let readings = parse_response(STATION).expect("should parse");
        assert_eq!(readings.len(), 2);

        let a = &readings[0];
        assert_eq!(a.sensor_id, "12345");
        assert_eq!(a.name, "Back Yard");
        assert_eq!(a.pm25_10m, Some(10.0));
        assert_eq!(a.temp_f, Some(79.0));
        assert_eq!(a.humidity, Some(28.0));
        assert_eq!(a.pressure, Some(1011.23));
        assert_eq!(a.last_seen.map(|t| t.timestamp()), Some(1600000000));

        let b = &readings[1];
        assert_eq!(b.sensor_id, "12346");
        assert_eq!(b.pm25_10m, Some(9.8));
        assert_eq!(b.temp_f, None);
        assert_eq!(b.last_seen, None);
    }

    #[test]
    fn malformed_stats_keeps_other_fields() {
        let readings = parse_response(
            r#"{"results": [{"ID": "7", "Label": "x", "Stats": "{not json", "temp_f": 70.5, "humidity": ""}]}"#,
        )
        .expect("top level is fine");
        assert_eq!(readings[0].sensor_id, "7");
        assert_eq!(readings[0].pm25_10m, None);
        assert_eq!(readings[0].temp_f, Some(70.5));
        assert_eq!(readings[0].humidity, None);
    }

    #[test]
    fn unexpected_field_types_are_absent() {
        let readings = parse_response(
            r#"{"results": [{"ID": 3, "Label": 42, "LastSeen": {}, "Stats": "{\"v1\": 4.0}", "temp_f": "68.0", "humidity": true, "pressure": [1]}]}"#,
        )
        .expect("odd fields should not fail the group");
        let r = &readings[0];
        assert_eq!(r.sensor_id, "3");
        assert_eq!(r.name, "42");
        assert_eq!(r.last_seen, None);
        assert_eq!(r.pm25_10m, Some(4.0));
        assert_eq!(r.temp_f, Some(68.0));
        assert_eq!(r.humidity, None);
        assert_eq!(r.pressure, None);
    }

    #[test]
    fn missing_stats() {
        let readings =
            parse_response(r#"{"results": [{"ID": 1, "Label": "x", "pressure": "990"}]}"#).unwrap();
        assert_eq!(readings[0].pm25_10m, None);
        assert_eq!(readings[0].pressure, Some(990.0));
    }

    #[test]
    fn missing_results() {
        assert!(parse_response(r#"{"code": 404}"#).unwrap().is_empty());
        parse_response("<html>").expect_err("not JSON");
    }

    /// Serve one canned HTTP response on a local port.
    /// Returns the base URL and a channel carrying the request line.
    fn serve_once(status: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("should bind");
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("should accept");
            let mut buf = [0u8; 4096];
            let n = stream.read(&mut buf).unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]);
            let _ = tx.send(request.lines().next().unwrap_or_default().to_owned());
            let resp = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(resp.as_bytes()).unwrap();
        });
        (format!("http://{addr}/"), rx)
    }

    #[test]
    fn fetch_over_http() {
        let (url, requests) = serve_once("200 OK", STATION);
        let mut client = PurpleAir::new(&url, Duration::from_secs(5)).unwrap();
        let readings = client.fetch("12345").expect("should fetch");
        assert_eq!(readings.len(), 2);
        assert_eq!(requests.recv().unwrap(), "GET /json?show=12345 HTTP/1.1");
    }

    #[test]
    fn server_error() {
        let (url, _requests) = serve_once("500 Internal Server Error", "{}");
        let mut client = PurpleAir::new(&url, Duration::from_secs(5)).unwrap();
        match client.fetch("12345") {
            Err(Error::Status { status, sensor_id }) => {
                assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(sensor_id, "12345");
            }
            other => panic!("expected a status error, got {:?}", other),
        }
    }

    #[test]
    fn bad_body() {
        let (url, _requests) = serve_once("200 OK", "<html>oops</html>");
        let mut client = PurpleAir::new(&url, Duration::from_secs(5)).unwrap();
        assert!(matches!(client.fetch("1"), Err(Error::Parse { .. })));
    }

    #[test]
    fn times_out_on_silent_server() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("should bind");
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            // Accept and hold the connection without ever answering.
            let (stream, _) = listener.accept().expect("should accept");
            std::thread::sleep(Duration::from_secs(5));
            drop(stream);
        });

        let timeout = Duration::from_millis(300);
        let mut client = PurpleAir::new(&format!("http://{addr}"), timeout).unwrap();
        let start = std::time::Instant::now();
        let result = client.fetch("1");
        let elapsed = start.elapsed();

        match result {
            Err(Error::Request { sensor_id, source }) => {
                assert_eq!(sensor_id, "1");
                assert!(source.is_timeout(), "{source}");
            }
            other => panic!("expected a request error, got {:?}", other),
        }
        assert!(elapsed < Duration::from_secs(3), "took {elapsed:?}");
    }
}
