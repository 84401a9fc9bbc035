use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use super::derived::SummaryMetrics;
use super::range::{select_range, CustomRange, DateRange, FilterKind};
use super::summary::{filter_and_summarize, RangeSummary};
use crate::transform::EnrichedRecord;

/// Everything the presentation layer needs for one range selection.
#[derive(Debug, Clone, Serialize)]
pub struct RangeReport<'a> {
    pub filter: FilterKind,
    pub label: String,
    pub range: DateRange,
    pub generated_at: DateTime<Utc>,
    pub records: Vec<&'a EnrichedRecord>,
    pub summary: RangeSummary,
    pub metrics: SummaryMetrics,
}

impl<'a> RangeReport<'a> {
    pub fn build(
        records: &'a [EnrichedRecord],
        filter: FilterKind,
        custom: Option<&CustomRange>,
        now: DateTime<Tz>,
    ) -> Self {
        let range = select_range(filter, custom, now);
        let (records, summary) = filter_and_summarize(records, &range);
        Self {
            filter,
            label: filter.label(),
            range,
            generated_at: now.with_timezone(&Utc),
            records,
            metrics: SummaryMetrics::from_summary(&summary),
            summary,
        }
    }
}
