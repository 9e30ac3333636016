//! Feature preprocessing: raw bars in, dense feature dataset out.
//!
//! 1. Drop any bar missing an OHLCV value.
//! 2. Ask the indicator source for indicator columns.
//! 3. Forward-fill every indicator column, then drop the leading rows that
//!    still have gaps (warm-up periods with nothing to carry).
//!
//! The result has no missing cells. A caller-supplied minimum row count
//! turns a too-short history into `InsufficientData`.

use std::sync::Arc;

use thiserror::Error;

use super::fill::{forward_fill, nan_as_none};
use super::indicators::IndicatorSource;
use crate::domain::{CleanBar, Dataset, FeatureRow, PriceBar};

/// Errors from preprocessing and splitting.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("insufficient historical data for {symbol}: {detail}")]
    InsufficientData { symbol: String, detail: String },

    #[error("indicator computation failed: {0}")]
    Indicators(#[source] anyhow::Error),
}

impl DatasetError {
    pub(crate) fn insufficient(symbol: &str, detail: impl Into<String>) -> Self {
        DatasetError::InsufficientData {
            symbol: symbol.to_string(),
            detail: detail.into(),
        }
    }
}

/// Turns raw bars into a gap-free feature dataset.
#[derive(Clone)]
pub struct FeaturePreprocessor {
    indicators: Arc<dyn IndicatorSource>,
}

impl FeaturePreprocessor {
    pub fn new(indicators: Arc<dyn IndicatorSource>) -> Self {
        Self { indicators }
    }

    pub fn indicator_names(&self) -> Vec<String> {
        self.indicators.indicator_names()
    }

    /// Step 1: keep only bars with every OHLCV value present.
    pub fn clean_bars(bars: &[PriceBar]) -> Vec<CleanBar> {
        bars.iter().filter_map(PriceBar::to_clean).collect()
    }

    /// Steps 1–3 in one call.
    pub fn process(
        &self,
        symbol: &str,
        bars: &[PriceBar],
        min_rows: usize,
    ) -> Result<Dataset, DatasetError> {
        let clean = Self::clean_bars(bars);
        self.engineer(symbol, &clean, min_rows)
    }

    /// Steps 2–3 over bars that are already clean.
    pub fn engineer(
        &self,
        symbol: &str,
        bars: &[CleanBar],
        min_rows: usize,
    ) -> Result<Dataset, DatasetError> {
        if bars.len() < min_rows || bars.is_empty() {
            return Err(DatasetError::insufficient(
                symbol,
                format!("{} clean rows, need at least {}", bars.len(), min_rows.max(1)),
            ));
        }

        let frame = self
            .indicators
            .compute(bars)
            .map_err(DatasetError::Indicators)?;
        if let Some(rows) = frame.row_count() {
            if rows != bars.len() {
                return Err(DatasetError::Indicators(anyhow::anyhow!(
                    "indicator source returned {rows} rows for {} bars",
                    bars.len()
                )));
            }
        }

        let names = frame.names().to_vec();
        let mut columns = frame.into_columns();
        for column in columns.iter_mut() {
            for cell in column.iter_mut() {
                *cell = nan_as_none(*cell);
            }
            forward_fill(column);
        }

        let rows: Vec<FeatureRow> = bars
            .iter()
            .enumerate()
            .filter_map(|(i, bar)| {
                let indicators = columns
                    .iter()
                    .map(|c| c[i])
                    .collect::<Option<Vec<f64>>>()?;
                Some(FeatureRow {
                    ticker: bar.ticker.clone(),
                    date: bar.date,
                    open: bar.open,
                    high: bar.high,
                    low: bar.low,
                    close: bar.close,
                    adj_close: bar.adj_close,
                    volume: bar.volume,
                    indicators,
                })
            })
            .collect();

        tracing::debug!(
            symbol,
            clean = bars.len(),
            complete = rows.len(),
            "features engineered"
        );

        if rows.len() < min_rows || rows.is_empty() {
            return Err(DatasetError::insufficient(
                symbol,
                format!(
                    "{} complete rows after indicators, need at least {}",
                    rows.len(),
                    min_rows.max(1)
                ),
            ));
        }

        Ok(Dataset::new(names, rows))
    }
}
