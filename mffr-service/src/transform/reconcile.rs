//! Record reconciliation: raw feed entry + nominal slot key -> `EnrichedRecord`.

use chrono::{DateTime, Duration, SecondsFormat, Timelike, Utc};
use chrono_tz::Tz;
use mffr_client::{Field, Flag, RawSlotEntry, Signal};

use super::record::{Anomaly, EnrichedRecord};
use crate::local_time::{parse_timestamp, slot_length};

/// An activation starting later than this into its slot is a backup response.
pub const BACKUP_START_TOLERANCE_SECS: u32 = 10;

/// An activation ending earlier than this before the nominal slot end was cancelled.
pub const CANCEL_TOLERANCE_SECS: i64 = 11;

/// Longest activation accepted as a real duration.
pub const MAX_DURATION_MIN: i64 = 24 * 60;

/// Reconcile one feed entry.
///
/// Feed values win when present and well typed; otherwise the field is
/// derived from timing. Never fails: anything that cannot be resolved is
/// `None` and noted in `anomalies`.
pub fn reconcile(timeslot: &str, entry: &RawSlotEntry, zone: Tz) -> EnrichedRecord {
    let mut anomalies = Vec::new();

    let slot_start = parse_timestamp(timeslot, zone);
    if slot_start.is_none() {
        anomalies.push(Anomaly::InvalidTimeslot);
    }
    let slot_end_at = slot_start.map(|s| s + slot_length());

    let start = timestamp_field(entry.start.as_ref(), "start", zone, &mut anomalies);
    let end = timestamp_field(entry.end.as_ref(), "end", zone, &mut anomalies);

    let duration = resolve_duration(entry.duration_min.as_ref(), start, end, &mut anomalies);

    let was_backup = flag_field(entry.was_backup.as_ref(), "was_backup", &mut anomalies)
        .or_else(|| start.map(|s| started_off_grid(s, zone)));

    let cancelled = flag_field(entry.cancelled.as_ref(), "cancelled", &mut anomalies)
        .or_else(|| match (end, slot_end_at) {
            (Some(e), Some(nominal)) => Some(ended_early(e, nominal)),
            _ => None,
        });

    let slot_end = string_field(entry.slot_end.as_ref(), "slot_end", &mut anomalies)
        .or_else(|| slot_end_at.map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true)));

    let (slot_date, slot_time) = slot_start
        .map(|s| {
            let local = s.with_timezone(&zone);
            (
                local.format("%d.%m.%Y").to_string(),
                local.format("%H:%M").to_string(),
            )
        })
        .unzip();

    let signal_raw = string_field(entry.signal.as_ref(), "signal", &mut anomalies);
    let signal = signal_raw.as_deref().and_then(Signal::parse);
    if signal_raw.is_some() && signal.is_none() {
        anomalies.push(Anomaly::UnknownSignal);
    }

    let mut num = |field: &Option<Field<f64>>, name: &'static str| {
        number_field(field.as_ref(), name, &mut anomalies)
    };
    let energy_kwh = num(&entry.energy_kwh, "energy_kwh");
    let grid_kwh = num(&entry.grid_kwh, "grid_kwh");
    let profit = num(&entry.profit, "profit");
    let grid_cost = num(&entry.grid_cost, "grid_cost");
    let fusebox_fee = num(&entry.fusebox_fee, "fusebox_fee");
    let ffr_income = num(&entry.ffr_income, "ffr_income");
    let net_total = num(&entry.net_total, "net_total");
    let price_per_kwh = num(&entry.price_per_kwh, "price_per_kwh");
    let mffr_price = num(&entry.mffr_price, "mffr_price");
    let nordpool_price = num(&entry.nordpool_price, "nordpool_price");
    let baseline_w = num(&entry.baseline_w, "baseline_w");

    EnrichedRecord {
        timeslot: timeslot.to_string(),
        slot_start,
        slot_end_at,
        slot_end,
        slot_date,
        slot_time,
        start,
        end,
        duration,
        was_backup,
        cancelled,
        signal,
        signal_raw,
        energy_kwh,
        grid_kwh,
        profit,
        grid_cost,
        fusebox_fee,
        ffr_income,
        net_total,
        price_per_kwh,
        mffr_price,
        nordpool_price,
        baseline_w,
        anomalies,
    }
}

fn started_off_grid(start: DateTime<Utc>, zone: Tz) -> bool {
    let local = start.with_timezone(&zone);
    local.minute() % 15 != 0 || local.second() > BACKUP_START_TOLERANCE_SECS
}

fn ended_early(end: DateTime<Utc>, nominal_end: DateTime<Utc>) -> bool {
    end < nominal_end - Duration::seconds(CANCEL_TOLERANCE_SECS)
}

/// Whole minutes, half rounded up.
fn rounded_minutes(span: Duration) -> i64 {
    (span.num_milliseconds() as f64 / 60_000.0 + 0.5).floor() as i64
}

fn resolve_duration(
    provided: Option<&Field<i64>>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    anomalies: &mut Vec<Anomaly>,
) -> Option<i64> {
    let minutes = match provided {
        Some(Field::Value(m)) => *m,
        other => {
            if other.is_some_and(Field::is_malformed) {
                anomalies.push(Anomaly::MalformedField { field: "duration_min" });
            }
            match (start, end) {
                (Some(s), Some(e)) => rounded_minutes(e - s),
                _ => {
                    anomalies.push(Anomaly::UnknownDuration);
                    return None;
                }
            }
        }
    };

    if minutes < 0 {
        anomalies.push(Anomaly::NegativeDuration { minutes });
        return None;
    }
    if minutes > MAX_DURATION_MIN {
        anomalies.push(Anomaly::ImplausibleDuration { minutes });
        return None;
    }
    Some(minutes)
}

fn timestamp_field(
    field: Option<&Field<String>>,
    name: &'static str,
    zone: Tz,
    anomalies: &mut Vec<Anomaly>,
) -> Option<DateTime<Utc>> {
    let raw = string_field(field, name, anomalies)?;
    let parsed = parse_timestamp(&raw, zone);
    if parsed.is_none() {
        anomalies.push(Anomaly::InvalidTimestamp { field: name });
    }
    parsed
}

fn string_field(
    field: Option<&Field<String>>,
    name: &'static str,
    anomalies: &mut Vec<Anomaly>,
) -> Option<String> {
    match field? {
        Field::Value(s) => Some(s.clone()),
        Field::Malformed(_) => {
            anomalies.push(Anomaly::MalformedField { field: name });
            None
        }
    }
}

fn flag_field(
    field: Option<&Field<Flag>>,
    name: &'static str,
    anomalies: &mut Vec<Anomaly>,
) -> Option<bool> {
    match field? {
        Field::Value(flag) => Some(flag.0),
        Field::Malformed(_) => {
            anomalies.push(Anomaly::MalformedField { field: name });
            None
        }
    }
}

fn number_field(
    field: Option<&Field<f64>>,
    name: &'static str,
    anomalies: &mut Vec<Anomaly>,
) -> Option<f64> {
    match field? {
        Field::Value(v) if v.is_finite() => Some(*v),
        _ => {
            anomalies.push(Anomaly::MalformedField { field: name });
            None
        }
    }
}
