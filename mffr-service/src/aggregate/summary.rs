use mffr_client::Signal;
use serde::Serialize;

use super::range::DateRange;
use crate::transform::EnrichedRecord;

/// Running sums for one bucket. Unknown values add zero, except the unit
/// price which is averaged over the records that actually carry one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BucketTotals {
    pub count: u64,
    pub energy: f64,
    pub grid_energy: f64,
    pub profit: f64,
    /// Minutes.
    pub duration: i64,
    pub backup: u64,
    pub cancelled: u64,
    pub grid_cost: f64,
    pub fusebox_fee: f64,
    pub ffr_income: f64,
    pub net_total: f64,
    pub price_sum: f64,
    pub price_count: u64,
}

impl BucketTotals {
    pub fn add(&mut self, r: &EnrichedRecord) {
        self.count += 1;
        self.energy += r.energy_kwh.unwrap_or(0.0);
        self.grid_energy += r.grid_kwh.unwrap_or(0.0);
        self.profit += r.profit.unwrap_or(0.0);
        self.duration = self.duration.saturating_add(r.duration.unwrap_or(0));
        self.backup += u64::from(r.was_backup.unwrap_or(false));
        self.cancelled += u64::from(r.cancelled.unwrap_or(false));
        self.grid_cost += r.grid_cost.unwrap_or(0.0);
        self.fusebox_fee += r.fusebox_fee.unwrap_or(0.0);
        self.ffr_income += r.ffr_income.unwrap_or(0.0);
        self.net_total += r.net_total.unwrap_or(0.0);
        if let Some(p) = r.price_per_kwh {
            self.price_sum += p;
            self.price_count += 1;
        }
    }

    /// Combine two partial folds.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            count: self.count + other.count,
            energy: self.energy + other.energy,
            grid_energy: self.grid_energy + other.grid_energy,
            profit: self.profit + other.profit,
            duration: self.duration.saturating_add(other.duration),
            backup: self.backup + other.backup,
            cancelled: self.cancelled + other.cancelled,
            grid_cost: self.grid_cost + other.grid_cost,
            fusebox_fee: self.fusebox_fee + other.fusebox_fee,
            ffr_income: self.ffr_income + other.ffr_income,
            net_total: self.net_total + other.net_total,
            price_sum: self.price_sum + other.price_sum,
            price_count: self.price_count + other.price_count,
        }
    }

    pub fn mean_price_per_kwh(&self) -> Option<f64> {
        (self.price_count > 0).then(|| self.price_sum / self.price_count as f64)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RangeSummary {
    pub up: BucketTotals,
    pub down: BucketTotals,
    pub total: BucketTotals,
}

impl RangeSummary {
    pub fn add(&mut self, r: &EnrichedRecord) {
        self.total.add(r);
        match r.signal {
            Some(Signal::Up) => self.up.add(r),
            Some(Signal::Down) => self.down.add(r),
            None => {}
        }
    }

    pub fn merge(&self, other: &Self) -> Self {
        Self {
            up: self.up.merge(&other.up),
            down: self.down.merge(&other.down),
            total: self.total.merge(&other.total),
        }
    }
}

impl<'a> FromIterator<&'a EnrichedRecord> for RangeSummary {
    fn from_iter<I: IntoIterator<Item = &'a EnrichedRecord>>(iter: I) -> Self {
        let mut summary = RangeSummary::default();
        for r in iter {
            summary.add(r);
        }
        summary
    }
}

/// Keep the records inside `range` (order preserved) and fold them.
pub fn filter_and_summarize<'a>(
    records: &'a [EnrichedRecord],
    range: &DateRange,
) -> (Vec<&'a EnrichedRecord>, RangeSummary) {
    let filtered: Vec<&EnrichedRecord> = records
        .iter()
        .filter(|r| range.contains(r.slot_start))
        .collect();
    let summary = filtered.iter().copied().collect();
    (filtered, summary)
}
