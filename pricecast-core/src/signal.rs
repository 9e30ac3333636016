//! Policy action → bounded price signal.
//!
//! A raw action is squashed with `tanh(action / hmax)` into (−1, 1) and
//! applied as at most a ±1% move on a reference close. The same transform
//! drives the single next-day prediction and the backtest price series.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{ActionRecord, Dataset, RawAction};
use crate::features::fill::forward_fill;

/// Largest fractional move one step can predict.
pub const MAX_STEP_ADJUSTMENT: f64 = 0.01;

/// One row of the actual-vs-predicted backtest series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceComparison {
    pub date: NaiveDate,
    pub actual_close: f64,
    pub predicted_close: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SignalTranslator {
    hmax: f64,
}

impl SignalTranslator {
    /// `hmax` is the environment's maximum position size per step.
    pub fn new(hmax: NonZeroU32) -> Self {
        Self {
            hmax: f64::from(hmax.get()),
        }
    }

    /// `tanh(scalar / hmax)`, strictly inside (−1, 1) for finite input.
    pub fn normalized_signal(&self, action: &RawAction) -> f64 {
        (action.scalar() / self.hmax).tanh()
    }

    /// Move `reference_close` by `signal` × 1%.
    pub fn apply(reference_close: f64, signal: f64) -> f64 {
        reference_close * (1.0 + signal * MAX_STEP_ADJUSTMENT)
    }

    /// Next-step prediction from the latest close and the latest action.
    ///
    /// With no action the reference close comes back unchanged.
    pub fn predict_next(&self, reference_close: f64, action: Option<&RawAction>) -> f64 {
        match action {
            Some(action) => Self::apply(reference_close, self.normalized_signal(action)),
            None => reference_close,
        }
    }

    /// Actual vs predicted close for every date in `test`.
    ///
    /// The actual close of a date is the mean close across its tickers. Each
    /// prediction applies that date's signal to the previous date's actual
    /// close; the first date uses its own close. A date without an action
    /// carries the most recent earlier action's signal, or 0 if none exists.
    pub fn price_comparison(
        &self,
        test: &Dataset,
        actions: &[ActionRecord],
    ) -> Vec<PriceComparison> {
        #[derive(Default)]
        struct Slot {
            close_sum: f64,
            close_count: usize,
            signal: Option<f64>,
        }

        let mut timeline: BTreeMap<NaiveDate, Slot> = BTreeMap::new();
        for row in test.rows() {
            let slot = timeline.entry(row.date).or_default();
            slot.close_sum += row.close;
            slot.close_count += 1;
        }
        if timeline.is_empty() {
            return Vec::new();
        }
        // Stable by date; on a shared date the later record wins.
        for record in actions {
            timeline.entry(record.date).or_default().signal =
                Some(self.normalized_signal(&record.action));
        }

        let mut signals: Vec<Option<f64>> = timeline.values().map(|s| s.signal).collect();
        forward_fill(&mut signals);

        let mut rows = Vec::with_capacity(test.len());
        let mut previous_close: Option<f64> = None;
        for ((date, slot), signal) in timeline.iter().zip(signals) {
            if slot.close_count == 0 {
                continue;
            }
            let actual_close = slot.close_sum / slot.close_count as f64;
            let reference = previous_close.unwrap_or(actual_close);
            rows.push(PriceComparison {
                date: *date,
                actual_close,
                predicted_close: Self::apply(reference, signal.unwrap_or(0.0)),
            });
            previous_close = Some(actual_close);
        }
        rows
    }
}
