pub mod aggregate;
pub mod api;
pub mod config;
pub mod local_time;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod sinks;
pub mod snapshot;
pub mod sources;
pub mod transform;

pub use pipeline::{Envelope, Pipeline};

use std::sync::Arc;

use crate::config::SettlementConfig;
use crate::transform::{EnrichedRecord, SettlementBackfill};

/// Per-record transforms enabled by configuration, in application order.
pub fn configured_transforms(
    settlement: &SettlementConfig,
) -> Vec<Arc<dyn pipeline::Transform<EnrichedRecord, EnrichedRecord>>> {
    let mut transforms: Vec<Arc<dyn pipeline::Transform<EnrichedRecord, EnrichedRecord>>> = Vec::new();
    if settlement.enabled {
        transforms.push(Arc::new(SettlementBackfill::new(settlement.params)));
    }
    transforms
}
