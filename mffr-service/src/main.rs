use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use mffr_service::{
    api::{self, ApiState},
    config::AppConfig,
    configured_transforms, metrics_server, observability,
    sinks::WatchSink,
    sources::FeedSource,
    Pipeline,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;
    let zone = cfg.zone()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let (sink, snapshots) = WatchSink::channel(Utc::now());
    let pipeline = Pipeline::new(
        FeedSource::from_config(&cfg.feed)?,
        zone,
        configured_transforms(&cfg.settlement),
        sink,
    );

    let api_state = ApiState { snapshots, zone };
    let bind_addr = cfg.api.bind_addr.clone();
    let api_task = tokio::spawn(async move { api::serve(&bind_addr, api_state).await });

    tracing::info!(
        timezone = %zone,
        settlement_backfill = cfg.settlement.enabled,
        refresh_secs = cfg.feed.refresh_interval_secs,
        "mffr service starting"
    );

    let refresh = Duration::from_secs(cfg.feed.refresh_interval_secs);
    tokio::select! {
        res = pipeline.run(refresh) => res?,
        res = api_task => res??,
    }

    Ok(())
}
