//! Presentation metrics derived from a finished [`RangeSummary`].
//!
//! Recomputed on demand, never stored. `None` is the "no data" sentinel and
//! renders as `-`.

use std::fmt::Display;

use serde::Serialize;

use super::summary::{BucketTotals, RangeSummary};

pub const NO_DATA: &str = "-";

/// Round half up, the way the dashboard has always rounded.
fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

/// Whole-number share of `count` in `total`.
pub fn percent(count: u64, total: u64) -> Option<i64> {
    (total > 0).then(|| round_half_up(count as f64 / total as f64 * 100.0))
}

/// €/MWh from a € amount and the kWh it is normalized against.
pub fn eur_per_mwh(net: f64, kwh: f64) -> Option<i64> {
    (kwh != 0.0).then(|| round_half_up(net / kwh * 1000.0))
}

/// `"{h}h {m}min"`, or the sentinel for zero.
pub fn format_duration(minutes: i64) -> String {
    if minutes == 0 {
        return NO_DATA.to_string();
    }
    format!("{}h {}min", minutes.div_euclid(60), minutes.rem_euclid(60))
}

pub fn or_no_data<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| NO_DATA.to_string(), |v| v.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketMetrics {
    /// Share of the range's records in this bucket.
    pub split_pct: Option<i64>,
    pub backup_pct: Option<i64>,
    pub cancelled_pct: Option<i64>,
    pub avg_eur_per_mwh: Option<i64>,
    pub mean_price_per_kwh: Option<f64>,
    pub duration_label: String,
}

impl BucketMetrics {
    fn new(bucket: &BucketTotals, split_pct: Option<i64>, avg_eur_per_mwh: Option<i64>) -> Self {
        Self {
            split_pct,
            backup_pct: percent(bucket.backup, bucket.count),
            cancelled_pct: percent(bucket.cancelled, bucket.count),
            avg_eur_per_mwh,
            mean_price_per_kwh: bucket.mean_price_per_kwh(),
            duration_label: format_duration(bucket.duration),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub up: BucketMetrics,
    pub down: BucketMetrics,
    pub total: BucketMetrics,
}

impl SummaryMetrics {
    /// DOWN is priced against grid energy, UP against battery energy: those
    /// are the billed flows for each direction.
    pub fn from_summary(s: &RangeSummary) -> Self {
        let total_count = s.total.count;
        let up_split = percent(s.up.count, total_count);
        // Two halves rounded up can reach 101; DOWN absorbs the excess.
        let down_split = percent(s.down.count, total_count)
            .map(|down| down.min(100 - up_split.unwrap_or(0)));
        Self {
            up: BucketMetrics::new(
                &s.up,
                up_split,
                eur_per_mwh(s.up.net_total, s.up.energy),
            ),
            down: BucketMetrics::new(
                &s.down,
                down_split,
                eur_per_mwh(s.down.net_total, s.down.grid_energy),
            ),
            total: BucketMetrics::new(&s.total, None, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn split(up: u64, down: u64, total: u64) -> (Option<i64>, Option<i64>) {
        let mut s = RangeSummary::default();
        s.up.count = up;
        s.down.count = down;
        s.total.count = total;
        let m = SummaryMetrics::from_summary(&s);
        (m.up.split_pct, m.down.split_pct)
    }

    #[test]
    fn even_split() {
        let mut s = RangeSummary::default();
        s.up.count = 1;
        s.down.count = 1;
        s.total.count = 2;
        let m = SummaryMetrics::from_summary(&s);
        assert_eq!(m.up.split_pct, Some(50));
        assert_eq!(m.down.split_pct, Some(50));
        assert_eq!(m.total.split_pct, None);
    }

    #[test]
    fn split_can_stay_below_hundred() {
        let mut s = RangeSummary::default();
        s.up.count = 1;
        s.down.count = 1;
        s.total.count = 3;
        let m = SummaryMetrics::from_summary(&s);
        assert_eq!(m.up.split_pct, Some(33));
        assert_eq!(m.down.split_pct, Some(33));
    }

    #[test]
    fn split_never_exceeds_hundred() {
        // 12.5% and 87.5% both round up.
        assert_eq!(split(1, 7, 8), (Some(13), Some(87)));
        assert_eq!(split(7, 1, 8), (Some(88), Some(12)));
        assert_eq!(split(0, 8, 8), (Some(0), Some(100)));
    }

    proptest! {
        #[test]
        fn split_sums_to_at_most_hundred(up in 0u64..500, down in 0u64..500, other in 0u64..500) {
            let total = up + down + other;
            let (u, d) = split(up, down, total);
            if total == 0 {
                prop_assert_eq!((u, d), (None, None));
            } else {
                let (u, d) = (u.unwrap(), d.unwrap());
                prop_assert!(u + d <= 100);
                prop_assert!(u >= 0 && d >= 0);
            }
        }
    }

    #[test]
    fn empty_summary_is_all_sentinels() {
        let m = SummaryMetrics::from_summary(&RangeSummary::default());
        for b in [&m.up, &m.down, &m.total] {
            assert_eq!(b.split_pct, None);
            assert_eq!(b.backup_pct, None);
            assert_eq!(b.cancelled_pct, None);
            assert_eq!(b.avg_eur_per_mwh, None);
            assert_eq!(b.mean_price_per_kwh, None);
            assert_eq!(b.duration_label, NO_DATA);
        }
    }

    #[test]
    fn unit_price_normalization_differs_by_direction() {
        let mut s = RangeSummary::default();
        s.up.count = 1;
        s.up.net_total = 2.0;
        s.up.energy = 10.0;
        s.up.grid_energy = 4.0;
        s.down.count = 1;
        s.down.net_total = 1.5;
        s.down.energy = 10.0;
        s.down.grid_energy = 5.0;
        s.total.count = 2;

        let m = SummaryMetrics::from_summary(&s);
        assert_eq!(m.up.avg_eur_per_mwh, Some(200));
        assert_eq!(m.down.avg_eur_per_mwh, Some(300));
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(percent(1, 8), Some(13)); // 12.5
        assert_eq!(percent(3, 8), Some(38)); // 37.5
        assert_eq!(percent(0, 0), None);
        assert_eq!(eur_per_mwh(-1.0, 1024.0), Some(-1)); // -0.977
        assert_eq!(eur_per_mwh(1.0, 0.0), None);
    }

    #[test]
    fn duration_labels() {
        assert_eq!(format_duration(0), "-");
        assert_eq!(format_duration(45), "0h 45min");
        assert_eq!(format_duration(135), "2h 15min");
    }

    #[test]
    fn sentinel_rendering() {
        assert_eq!(or_no_data(Some(42)), "42");
        assert_eq!(or_no_data::<i64>(None), "-");
    }
}
