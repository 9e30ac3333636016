//! Bars, the fundamental market data unit, before and after cleaning.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV observation as delivered by a provider.
///
/// Every value is optional: upstream gaps arrive as nulls and survive until
/// the preprocessor drops the bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adj_close: Option<f64>,
    pub volume: Option<f64>,
}

impl PriceBar {
    /// Returns the fully populated bar, or `None` if any value is missing.
    ///
    /// NaN counts as missing.
    pub fn to_clean(&self) -> Option<CleanBar> {
        let present = |v: Option<f64>| v.filter(|x| !x.is_nan());
        Some(CleanBar {
            ticker: self.ticker.clone(),
            date: self.date,
            open: present(self.open)?,
            high: present(self.high)?,
            low: present(self.low)?,
            close: present(self.close)?,
            adj_close: present(self.adj_close)?,
            volume: present(self.volume)?,
        })
    }
}

/// A bar with every OHLCV value present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
}
