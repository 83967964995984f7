use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use purpleair_exporter::{
    config::{Args, Settings},
    context::Context,
    metrics::Metrics,
    sensor::purpleair::PurpleAir,
    web, Poller,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let settings: Settings = Args::parse().into();
    tracing::info!(
        "starting purpleair-exporter v{} for sensors {:?}",
        env!("CARGO_PKG_VERSION"),
        settings.sensor_ids
    );

    let ctx = Context::new();
    {
        let ctx = ctx.clone();
        ctrlc::set_handler(move || {
            tracing::info!("got SIGINT, closing context");
            ctx.cancel();
        })
        .context("could not set SIGINT handler")?;
    }

    let metrics = Metrics::new();
    let server = web::spawn(settings.listen, metrics.clone(), ctx.clone())
        .context("could not start metrics server")?;

    let source = PurpleAir::new(&settings.base_url, settings.timeout)?;
    let mut poller = Poller::new(source, metrics, settings.negative_policy);
    poller.run(&settings.sensor_ids, settings.refresh, &ctx);
    ctx.cancel();

    match server.join() {
        Ok(result) => result.context("metrics server failed")?,
        Err(_) => anyhow::bail!("metrics server thread panicked"),
    }

    tracing::info!("shut down");
    Ok(())
}
