pub mod derived;
pub mod range;
pub mod report;
pub mod summary;

pub use derived::{or_no_data, BucketMetrics, SummaryMetrics, NO_DATA};
pub use range::{select_range, CustomRange, DateRange, FilterKind, RangeError};
pub use report::RangeReport;
pub use summary::{filter_and_summarize, BucketTotals, RangeSummary};
