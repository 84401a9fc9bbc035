pub mod json_report;
pub mod channel;

pub use json_report::JsonReportSink;
pub use channel::{SnapshotReceiver, WatchSink};
