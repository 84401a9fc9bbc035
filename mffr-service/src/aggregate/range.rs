//! Range selection for the summary view.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::local_time::{end_of_day, parse_local_date, parse_timestamp, start_of_day};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("unknown filter kind '{0}'")]
    UnknownFilter(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    All,
    #[default]
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    Custom,
}

impl FilterKind {
    pub const ALL: [FilterKind; 8] = [
        FilterKind::All,
        FilterKind::Today,
        FilterKind::Yesterday,
        FilterKind::ThisWeek,
        FilterKind::LastWeek,
        FilterKind::ThisMonth,
        FilterKind::LastMonth,
        FilterKind::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::All => "all",
            FilterKind::Today => "today",
            FilterKind::Yesterday => "yesterday",
            FilterKind::ThisWeek => "this_week",
            FilterKind::LastWeek => "last_week",
            FilterKind::ThisMonth => "this_month",
            FilterKind::LastMonth => "last_month",
            FilterKind::Custom => "custom",
        }
    }

    /// Human label, e.g. `this week`.
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| RangeError::UnknownFilter(s.to_string()))
    }
}

/// Caller-supplied bounds for [`FilterKind::Custom`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomRange {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

impl CustomRange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Inclusive instant bounds. A missing bound disables filtering entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub const UNBOUNDED: DateRange = DateRange { from: None, to: None };

    pub fn days(first: NaiveDate, last: NaiveDate, zone: Tz) -> Self {
        Self {
            from: Some(start_of_day(first, zone)),
            to: end_of_day(last, zone),
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    /// Records without a slot start only pass an unbounded range.
    pub fn contains(&self, slot_start: Option<DateTime<Utc>>) -> bool {
        match (self.from, self.to) {
            (Some(from), Some(to)) => slot_start.is_some_and(|s| from <= s && s <= to),
            _ => true,
        }
    }
}

/// Resolve a filter kind to instant bounds relative to `now`'s local calendar.
///
/// For `custom`, an empty or unparseable bound resolves to `None`, which
/// makes the whole range unbounded.
pub fn select_range(kind: FilterKind, custom: Option<&CustomRange>, now: DateTime<Tz>) -> DateRange {
    let zone = now.timezone();
    let today = now.date_naive();

    match kind {
        FilterKind::All => DateRange::UNBOUNDED,
        FilterKind::Today => DateRange::days(today, today, zone),
        FilterKind::Yesterday => {
            let y = today - Duration::days(1);
            DateRange::days(y, y, zone)
        }
        FilterKind::ThisWeek => {
            let monday = week_start(today);
            DateRange::days(monday, monday + Duration::days(6), zone)
        }
        FilterKind::LastWeek => {
            let monday = week_start(today) - Duration::days(7);
            DateRange::days(monday, monday + Duration::days(6), zone)
        }
        FilterKind::ThisMonth => {
            let first = month_start(today);
            DateRange::days(first, next_month_start(first) - Duration::days(1), zone)
        }
        FilterKind::LastMonth => {
            let this_first = month_start(today);
            let last_day = this_first - Duration::days(1);
            DateRange::days(month_start(last_day), last_day, zone)
        }
        FilterKind::Custom => {
            let custom = custom.cloned().unwrap_or_default();
            DateRange {
                from: custom_bound(&custom.from, zone, |d, z| Some(start_of_day(d, z))),
                to: custom_bound(&custom.to, zone, end_of_day),
            }
        }
    }
}

fn custom_bound(
    raw: &str,
    zone: Tz,
    day_edge: fn(NaiveDate, Tz) -> Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    match parse_local_date(raw) {
        Some(date) => day_edge(date, zone),
        None => parse_timestamp(raw, zone),
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

fn next_month_start(first: NaiveDate) -> NaiveDate {
    // The 1st plus 31 days is always in the following month.
    month_start(first + Duration::days(31))
}
