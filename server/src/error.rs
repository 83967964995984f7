//! Errors from fetching sensor data and serving metrics.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Network failure or timeout talking to PurpleAir.
    #[error("request for sensor {sensor_id} failed: {source}")]
    Request {
        sensor_id: String,
        #[source]
        source: reqwest::Error,
    },

    /// PurpleAir answered with a non-success status.
    #[error("got {status} from purpleair for sensor {sensor_id}")]
    Status {
        sensor_id: String,
        status: reqwest::StatusCode,
    },

    /// The response body was not the JSON we expect.
    #[error("malformed response for sensor {sensor_id}: {source}")]
    Parse {
        sensor_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("could not listen on {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("metrics server failed: {0}")]
    Serve(#[source] std::io::Error),
}
