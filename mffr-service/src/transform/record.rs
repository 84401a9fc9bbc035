use std::fmt;

use chrono::{DateTime, Utc};
use mffr_client::Signal;
use serde::Serialize;

/// Data-quality condition found while reconciling a slot entry.
///
/// The affected value is left unknown (`None`) instead of failing the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    InvalidTimeslot,
    InvalidTimestamp { field: &'static str },
    MalformedField { field: &'static str },
    NegativeDuration { minutes: i64 },
    ImplausibleDuration { minutes: i64 },
    UnknownDuration,
    UnknownSignal,
}

impl Anomaly {
    /// Stable label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Anomaly::InvalidTimeslot => "invalid_timeslot",
            Anomaly::InvalidTimestamp { .. } => "invalid_timestamp",
            Anomaly::MalformedField { .. } => "malformed_field",
            Anomaly::NegativeDuration { .. } => "negative_duration",
            Anomaly::ImplausibleDuration { .. } => "implausible_duration",
            Anomaly::UnknownDuration => "unknown_duration",
            Anomaly::UnknownSignal => "unknown_signal",
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::InvalidTimeslot => f.write_str("timeslot is not a timestamp"),
            Anomaly::InvalidTimestamp { field } => write!(f, "{field} is not a timestamp"),
            Anomaly::MalformedField { field } => write!(f, "{field} has the wrong type"),
            Anomaly::NegativeDuration { minutes } => write!(f, "duration is negative ({minutes} min)"),
            Anomaly::ImplausibleDuration { minutes } => {
                write!(f, "duration exceeds a day ({minutes} min)")
            }
            Anomaly::UnknownDuration => f.write_str("duration cannot be derived"),
            Anomaly::UnknownSignal => f.write_str("signal is neither UP nor DOWN"),
        }
    }
}

/// Canonical slot record with every derived field resolved.
///
/// `slotStart`/`slotEnd` are always computed from `timeslot`. Everything the
/// presentation layer shows comes from here; it never re-derives values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichedRecord {
    pub timeslot: String,
    #[serde(rename = "slotStart")]
    pub slot_start: Option<DateTime<Utc>>,
    #[serde(rename = "slotEnd")]
    pub slot_end_at: Option<DateTime<Utc>>,
    /// Feed-provided slot end if present, otherwise `slotEnd` as RFC 3339.
    pub slot_end: Option<String>,
    pub slot_date: Option<String>,
    pub slot_time: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Minutes.
    pub duration: Option<i64>,
    pub was_backup: Option<bool>,
    pub cancelled: Option<bool>,
    pub signal: Option<Signal>,
    pub signal_raw: Option<String>,
    pub energy_kwh: Option<f64>,
    pub grid_kwh: Option<f64>,
    pub profit: Option<f64>,
    pub grid_cost: Option<f64>,
    pub fusebox_fee: Option<f64>,
    pub ffr_income: Option<f64>,
    pub net_total: Option<f64>,
    pub price_per_kwh: Option<f64>,
    pub mffr_price: Option<f64>,
    pub nordpool_price: Option<f64>,
    pub baseline_w: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<Anomaly>,
}

impl EnrichedRecord {
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}
