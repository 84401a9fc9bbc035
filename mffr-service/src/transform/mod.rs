pub mod reconcile;
pub mod record;
pub mod settlement;

pub use reconcile::{reconcile, BACKUP_START_TOLERANCE_SECS, CANCEL_TOLERANCE_SECS, MAX_DURATION_MIN};
pub use record::{Anomaly, EnrichedRecord};
pub use settlement::{settle, Settlement, SettlementBackfill, SettlementParams};
