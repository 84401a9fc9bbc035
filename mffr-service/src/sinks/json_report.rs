use std::{io::Write, sync::Arc, sync::Mutex};

use chrono_tz::Tz;

use crate::aggregate::{or_no_data, CustomRange, FilterKind, RangeReport};
use crate::pipeline::{PipelineError, Sink};
use crate::snapshot::Snapshot;

/// Writes one [`RangeReport`] per snapshot as JSON.
///
/// The range is resolved against the snapshot's fetch time, so the output
/// depends only on the feed and the selected filter.
pub struct JsonReportSink<W> {
    writer: Mutex<W>,
    filter: FilterKind,
    custom: Option<CustomRange>,
    zone: Tz,
    pretty: bool,
}

impl<W: Write + Send> JsonReportSink<W> {
    pub fn new(writer: W, filter: FilterKind, custom: Option<CustomRange>, zone: Tz) -> Self {
        Self {
            writer: Mutex::new(writer),
            filter,
            custom,
            zone,
            pretty: true,
        }
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn into_inner(self) -> Result<W, PipelineError> {
        self.writer
            .into_inner()
            .map_err(|_| PipelineError::Sink("report writer lock poisoned".to_string()))
    }
}

impl<W: Write + Send> Sink for JsonReportSink<W> {
    fn publish(&self, snapshot: Arc<Snapshot>) -> Result<(), PipelineError> {
        let now = snapshot.fetched_at().with_timezone(&self.zone);
        let report = RangeReport::build(snapshot.records(), self.filter, self.custom.as_ref(), now);

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| PipelineError::Sink("report writer lock poisoned".to_string()))?;

        let res = if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &report)
        } else {
            serde_json::to_writer(&mut *writer, &report)
        };
        res.map_err(|e| PipelineError::Sink(format!("failed to write report: {e}")))?;
        writeln!(writer).map_err(|e| PipelineError::Sink(format!("failed to write report: {e}")))?;
        writer
            .flush()
            .map_err(|e| PipelineError::Sink(format!("failed to flush report: {e}")))?;

        tracing::debug!(
            filter = %self.filter,
            records = report.records.len(),
            up_split = %or_no_data(report.metrics.up.split_pct),
            down_split = %or_no_data(report.metrics.down.split_pct),
            "range report written"
        );
        Ok(())
    }
}
