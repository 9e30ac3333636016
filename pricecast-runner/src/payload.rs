//! Result payloads handed to the request layer, and their builders.
//!
//! Field names serialize in camelCase; dates as `YYYY-MM-DD`.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use pricecast_core::domain::{CleanBar, Dataset, RawAction, Trajectory};
use pricecast_core::signal::{PriceComparison, SignalTranslator};

use crate::error::PipelineError;
use crate::metrics::{round_to, BacktestMetrics};

pub const DISCLAIMER: &str = "Educational use only. These simulations are NOT financial advice.";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionPoint {
    pub date: NaiveDate,
    pub predicted_close: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionPayload {
    pub symbol: String,
    pub latest_close: f64,
    pub predicted_next_close: f64,
    pub generated_at: DateTime<Utc>,
    pub price_history: Vec<PricePoint>,
    pub prediction_point: PredictionPoint,
    pub disclaimer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestPayload {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub equity_curve: Vec<EquityPoint>,
    pub price_comparison: Vec<PriceComparison>,
    pub metrics: BacktestMetrics,
    pub disclaimer: String,
}

/// Live-path prediction: the payload plus the move it implies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePrediction {
    #[serde(flatten)]
    pub prediction: PredictionPayload,
    pub delta: f64,
    pub delta_pct: f64,
}

impl PredictionPayload {
    /// Next-day prediction from the latest cleaned bar and the latest action.
    ///
    /// `bars` must be date-ordered; the last `history_points` closes become
    /// the price history.
    pub fn build(
        symbol: &str,
        bars: &[CleanBar],
        last_action: Option<&RawAction>,
        translator: &SignalTranslator,
        history_points: usize,
        generated_at: DateTime<Utc>,
    ) -> Result<Self, PipelineError> {
        let latest = bars.last().ok_or_else(|| PipelineError::NoData {
            symbol: symbol.to_string(),
        })?;
        let next_date = latest
            .date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| anyhow::anyhow!("no calendar day after {}", latest.date))?;
        let predicted = round_to(translator.predict_next(latest.close, last_action), 4);

        let skip = bars.len().saturating_sub(history_points);
        let price_history = bars[skip..]
            .iter()
            .map(|b| PricePoint {
                date: b.date,
                value: b.close,
            })
            .collect();

        Ok(Self {
            symbol: symbol.to_string(),
            latest_close: latest.close,
            predicted_next_close: predicted,
            generated_at,
            price_history,
            prediction_point: PredictionPoint {
                date: next_date,
                predicted_close: predicted,
            },
            disclaimer: DISCLAIMER.to_string(),
        })
    }
}

impl BacktestPayload {
    /// Equity curve, price comparison over `test`, and metrics.
    pub fn build(
        symbol: &str,
        trajectory: &Trajectory,
        test: &Dataset,
        translator: &SignalTranslator,
        generated_at: DateTime<Utc>,
    ) -> Result<Self, PipelineError> {
        let metrics = BacktestMetrics::compute(&trajectory.accounts)
            .ok_or_else(|| anyhow::anyhow!("simulation produced an empty equity curve"))?;

        Ok(Self {
            symbol: symbol.to_string(),
            generated_at,
            equity_curve: trajectory
                .accounts
                .iter()
                .map(|a| EquityPoint {
                    date: a.date,
                    equity: a.account_value,
                })
                .collect(),
            price_comparison: translator.price_comparison(test, &trajectory.actions),
            metrics,
            disclaimer: DISCLAIMER.to_string(),
        })
    }
}

impl LivePrediction {
    pub fn new(prediction: PredictionPayload) -> Self {
        let delta = prediction.predicted_next_close - prediction.latest_close;
        let delta_pct = if prediction.latest_close != 0.0 {
            delta / prediction.latest_close * 100.0
        } else {
            0.0
        };
        Self {
            prediction,
            delta,
            delta_pct,
        }
    }
}
