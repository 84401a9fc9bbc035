use std::{env, io};

use anyhow::{bail, Result};
use mffr_service::{
    aggregate::{CustomRange, FilterKind},
    config::AppConfig,
    configured_transforms, observability,
    sinks::JsonReportSink,
    sources::FeedSource,
    Pipeline,
};

/// Fetches the feed once and prints the range report for one filter.
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        let kinds: Vec<&str> = FilterKind::ALL.iter().map(FilterKind::as_str).collect();
        bail!("usage: summarize <{}> [<from> <to>]", kinds.join("|"));
    }
    let filter: FilterKind = args[1].parse()?;
    let custom = match (filter, args.get(2), args.get(3)) {
        (FilterKind::Custom, Some(from), Some(to)) => Some(CustomRange::new(from.as_str(), to.as_str())),
        (FilterKind::Custom, _, _) => bail!("usage: summarize custom <from> <to>"),
        _ => None,
    };

    let cfg = AppConfig::load()?;
    let zone = cfg.zone()?;

    let pipeline = Pipeline::new(
        FeedSource::from_config(&cfg.feed)?,
        zone,
        configured_transforms(&cfg.settlement),
        JsonReportSink::new(io::stdout(), filter, custom, zone),
    );
    pipeline.run_once().await?;

    Ok(())
}
