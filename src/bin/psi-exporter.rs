use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use psi_exporter::{
    Fetcher, MetricStore, SchedulerHandle,
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{Args, Config},
    psi::HttpPsiClient,
};
use tracing::{debug, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

fn init(level: LevelFilter) {
    let filter = filter::Targets::new().with_targets(vec![
        ("psi_exporter", level),
        ("tower_http", level),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init(args.log_level);

    // resolve before binding anything; a missing key or URL list is fatal
    let config = Config::from_args(&args)?;
    debug!("resolved config: {config:?}");

    let store = MetricStore::new()?;
    let client = HttpPsiClient::new(config.api_key.clone(), config.request_timeout)?;
    let fetcher = Fetcher::new(Arc::new(client), store);

    info!(
        "monitoring {} targets at minutes {:?}",
        config.targets.len(),
        config.minutes.iter().collect::<Vec<_>>()
    );

    let scheduler = SchedulerHandle::spawn(config.scheduler_config(), fetcher.clone());

    spawn_api_server(
        ApiConfig {
            bind_addr: config.bind_addr,
        },
        ApiState::new(fetcher),
    )
    .await
    .with_context(|| format!("failed to start server on {}", config.bind_addr))?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("shutting down");
    if let Err(e) = scheduler.shutdown().await {
        warn!("{e:#}");
    }

    Ok(())
}
