//! HTTP endpoint serving the metrics registry to Prometheus.
//!
//! The poll loop is blocking, so the listener gets its own thread and a
//! single-threaded async runtime.

use std::net::SocketAddr;
use std::thread::JoinHandle;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::metrics::Metrics;

/// Routes for the metrics endpoint.
pub fn router(metrics: Metrics) -> Router {
    Router::new()
        .route("/metrics", get(scrape))
        .with_state(metrics)
}

async fn scrape(State(metrics): State<Metrics>) -> Response {
    match metrics.render() {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            tracing::error!("could not encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Resolves once `ctx` is cancelled.
///
/// The wait parks a blocking-pool thread on the context's condvar. `spawn`
/// cancels the context itself if serving fails, so that thread is always
/// released before the runtime is dropped.
async fn cancelled(ctx: Context) {
    if let Err(e) = tokio::task::spawn_blocking(move || ctx.wait()).await {
        tracing::error!("shutdown watcher failed: {}", e);
    }
}

/// Serve metrics on `addr` from a background thread until `ctx` is cancelled.
///
/// The port is bound before returning, so a port conflict is reported here
/// rather than from the thread. If the server fails later, the thread
/// cancels `ctx` so the rest of the process winds down too.
pub fn spawn(addr: SocketAddr, metrics: Metrics, ctx: Context) -> Result<JoinHandle<Result<()>>> {
    let listener = std::net::TcpListener::bind(addr).map_err(|source| Error::Bind { addr, source })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| Error::Bind { addr, source })?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(Error::Serve)?;

    let handle = std::thread::Builder::new()
        .name("metrics".to_owned())
        .spawn(move || {
            let result = runtime.block_on(async {
                let listener = tokio::net::TcpListener::from_std(listener).map_err(Error::Serve)?;
                tracing::info!("serving prometheus on http://{}/metrics", addr);
                axum::serve(listener, router(metrics))
                    .with_graceful_shutdown(cancelled(ctx.clone()))
                    .await
                    .map_err(Error::Serve)
            });
            if let Err(e) = &result {
                tracing::error!("{}", e);
                ctx.cancel();
            }
            result
        })
        .map_err(Error::Serve)?;
    Ok(handle)
}
