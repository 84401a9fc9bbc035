use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::field::{Field, Flag};

/// Feed document: slot entries keyed by their ISO-8601 timeslot start.
///
/// Keys are not guaranteed to arrive sorted; a `BTreeMap` gives a stable
/// iteration order regardless of how the server emitted them.
pub type RawFeed = BTreeMap<String, RawSlotEntry>;

/// One slot entry exactly as the feed delivers it. Every column may be
/// missing, `null` or of the wrong type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSlotEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Field<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Field<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<Field<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub was_backup: Option<Field<Flag>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled: Option<Field<Flag>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_end: Option<Field<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<Field<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_kwh: Option<Field<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_kwh: Option<Field<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit: Option<Field<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_cost: Option<Field<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fusebox_fee: Option<Field<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffr_income: Option<Field<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_total: Option<Field<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_kwh: Option<Field<f64>>,
    /// €/MWh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mffr_price: Option<Field<f64>>,
    /// €/kWh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nordpool_price: Option<Field<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_w: Option<Field<f64>>,
}
