//! Backfill of the financial breakdown for finished slots that the feed has
//! not settled yet.

use chrono::{DateTime, Utc};
use mffr_client::Signal;
use serde::Deserialize;

use super::record::EnrichedRecord;
use crate::pipeline::{Envelope, PipelineError, Transform};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SettlementParams {
    /// Aggregator's share of activation revenue.
    pub fusebox_share: f64,
    /// VAT/multiplier on imported grid energy.
    pub grid_import_mult: f64,
    /// Slots below this are noise and left unsettled.
    pub min_energy_kwh: f64,
}

impl Default for SettlementParams {
    fn default() -> Self {
        Self {
            fusebox_share: 0.20,
            grid_import_mult: 1.24,
            min_energy_kwh: 0.00001,
        }
    }
}

/// Computed breakdown for one slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub profit: f64,
    pub fusebox_fee: f64,
    pub grid_cost: f64,
    pub net_total: f64,
    pub price_per_kwh: Option<f64>,
}

fn round5(v: f64) -> f64 {
    (v * 100_000.0).round() / 100_000.0
}

/// Settle a slot from its energy and prices.
///
/// `None` when the direction, energy, grid energy or either price is unknown,
/// or the energy is below the noise floor.
pub fn settle(record: &EnrichedRecord, params: &SettlementParams) -> Option<Settlement> {
    let signal = record.signal?;
    let energy = record.energy_kwh?;
    let grid = record.grid_kwh?;
    let mffr = record.mffr_price? / 1000.0;
    let nps = record.nordpool_price?;

    if energy < params.min_energy_kwh {
        return None;
    }

    let share = 1.0 - params.fusebox_share;
    let fee_of = |income: f64| {
        if share > 0.0 {
            income * (params.fusebox_share / share)
        } else {
            0.0
        }
    };

    let s = match signal {
        Signal::Down => {
            let income = (nps - mffr) * energy * share;
            let import = grid.max(0.0);
            let grid_cost = nps * params.grid_import_mult * import;
            let net = income - grid_cost;
            Settlement {
                profit: income,
                fusebox_fee: fee_of(income),
                grid_cost,
                net_total: net,
                price_per_kwh: (import > 0.0).then(|| net / import),
            }
        }
        Signal::Up => {
            let income = (mffr - nps) * energy * share;
            let export = (-grid).max(0.0);
            let export_income = nps * export;
            let net = income + export_income;
            Settlement {
                profit: income,
                fusebox_fee: fee_of(income),
                // Negative cost is export income.
                grid_cost: -export_income,
                net_total: net,
                price_per_kwh: (energy > 0.0).then(|| net / energy),
            }
        }
    };

    Some(Settlement {
        profit: round5(s.profit),
        fusebox_fee: round5(s.fusebox_fee),
        grid_cost: round5(s.grid_cost),
        net_total: round5(s.net_total),
        price_per_kwh: s.price_per_kwh.map(round5),
    })
}

/// Fills missing financial fields of finished slots. Values already present
/// in the feed are never overwritten.
#[derive(Debug, Clone, Default)]
pub struct SettlementBackfill {
    params: SettlementParams,
}

impl SettlementBackfill {
    pub fn new(params: SettlementParams) -> Self {
        Self { params }
    }

    pub fn backfill(
        &self,
        record: EnrichedRecord,
        as_of: DateTime<Utc>,
    ) -> Result<EnrichedRecord, PipelineError> {
        if record.profit.is_some() && record.net_total.is_some() {
            return Ok(record);
        }
        // Still running (or no nominal end to judge by).
        match record.slot_end_at {
            Some(end) if end <= as_of => {}
            _ => return Ok(record),
        }
        let Some(s) = settle(&record, &self.params) else {
            return Ok(record);
        };
        if !s.net_total.is_finite() {
            return Err(PipelineError::Transform(format!(
                "non-finite settlement for slot {}",
                record.timeslot
            )));
        }

        metrics::counter!("settlement_backfilled_total").increment(1);
        tracing::debug!(timeslot = %record.timeslot, net_total = s.net_total, "settled slot");

        Ok(EnrichedRecord {
            profit: record.profit.or(Some(s.profit)),
            fusebox_fee: record.fusebox_fee.or(Some(s.fusebox_fee)),
            grid_cost: record.grid_cost.or(Some(s.grid_cost)),
            net_total: record.net_total.or(Some(s.net_total)),
            price_per_kwh: record.price_per_kwh.or(s.price_per_kwh),
            ..record
        })
    }
}

impl Transform<EnrichedRecord, EnrichedRecord> for SettlementBackfill {
    fn apply(
        &self,
        input: Envelope<EnrichedRecord>,
    ) -> Result<Envelope<EnrichedRecord>, PipelineError> {
        let as_of = input.received_at;
        let payload = self.backfill(input.payload, as_of)?;
        Ok(Envelope::new(payload, as_of))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn finished(signal: Signal, energy: f64, grid: f64) -> EnrichedRecord {
        EnrichedRecord {
            timeslot: "2024-01-01T10:00:00+02:00".to_string(),
            slot_start: Some(at("2024-01-01T08:00:00Z")),
            slot_end_at: Some(at("2024-01-01T08:15:00Z")),
            signal: Some(signal),
            energy_kwh: Some(energy),
            grid_kwh: Some(grid),
            mffr_price: Some(250.0),
            nordpool_price: Some(0.05),
            ..Default::default()
        }
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn up_slot_earns_spread_plus_export() {
        let s = settle(&finished(Signal::Up, 10.0, -4.0), &SettlementParams::default()).unwrap();
        // (0.25 - 0.05) * 10 * 0.8
        assert_close(s.profit, 1.6);
        assert_close(s.fusebox_fee, 0.4);
        assert_close(s.grid_cost, -0.2);
        assert_close(s.net_total, 1.8);
        assert_close(s.price_per_kwh.unwrap(), 0.18);
    }

    #[test]
    fn down_slot_pays_for_imported_energy() {
        let mut r = finished(Signal::Down, 10.0, 5.0);
        r.mffr_price = Some(-100.0);
        let s = settle(&r, &SettlementParams::default()).unwrap();
        // (0.05 - (-0.1)) * 10 * 0.8
        assert_close(s.profit, 1.2);
        assert_close(s.grid_cost, 0.31);
        assert_close(s.net_total, 0.89);
        assert_close(s.price_per_kwh.unwrap(), 0.178);
    }

    #[test]
    fn down_slot_without_import_has_no_unit_price() {
        let s = settle(&finished(Signal::Down, 10.0, -1.0), &SettlementParams::default()).unwrap();
        assert_eq!(s.grid_cost, 0.0);
        assert_eq!(s.price_per_kwh, None);
    }

    #[test]
    fn missing_inputs_or_noise_leave_slot_unsettled() {
        let params = SettlementParams::default();
        let mut no_price = finished(Signal::Up, 10.0, 0.0);
        no_price.nordpool_price = None;
        assert_eq!(settle(&no_price, &params), None);
        assert_eq!(settle(&finished(Signal::Up, 0.0, 0.0), &params), None);
    }

    #[test]
    fn backfill_only_fills_gaps_of_finished_slots() {
        let t = SettlementBackfill::default();
        let mut r = finished(Signal::Up, 10.0, -4.0);
        r.profit = Some(9.0);

        let running = t.backfill(r.clone(), at("2024-01-01T08:10:00Z")).unwrap();
        assert_eq!(running.net_total, None);

        let done = t.backfill(r, at("2024-01-01T08:15:00Z")).unwrap();
        assert_eq!(done.profit, Some(9.0));
        assert_close(done.net_total.unwrap(), 1.8);
        assert_close(done.fusebox_fee.unwrap(), 0.4);
    }

    #[test]
    fn settled_records_pass_through() {
        let mut r = finished(Signal::Down, 10.0, 5.0);
        r.profit = Some(1.0);
        r.net_total = Some(2.0);
        let out = SettlementBackfill::default()
            .backfill(r.clone(), at("2024-02-01T00:00:00Z"))
            .unwrap();
        assert_eq!(out, r);
    }
}
