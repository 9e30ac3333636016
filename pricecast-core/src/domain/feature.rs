//! Feature rows and the ordered dataset they form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeBounds;

/// A cleaned bar plus its indicator values.
///
/// `indicators[i]` is the value of `Dataset::indicator_names()[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
    pub indicators: Vec<f64>,
}

/// Date-ordered feature rows for one or more tickers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    indicator_names: Vec<String>,
    rows: Vec<FeatureRow>,
}

impl Dataset {
    /// Builds a dataset, sorting rows by (date, ticker).
    pub fn new(indicator_names: Vec<String>, mut rows: Vec<FeatureRow>) -> Self {
        rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.ticker.cmp(&b.ticker)));
        Self {
            indicator_names,
            rows,
        }
    }

    pub fn indicator_names(&self) -> &[String] {
        &self.indicator_names
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct tickers, sorted.
    pub fn tickers(&self) -> Vec<&str> {
        self.rows
            .iter()
            .map(|r| r.ticker.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn min_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Rows whose date falls inside `range`, as a new dataset.
    pub fn slice_dates<R: RangeBounds<NaiveDate>>(&self, range: R) -> Dataset {
        Dataset {
            indicator_names: self.indicator_names.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| range.contains(&r.date))
                .cloned()
                .collect(),
        }
    }

    /// Deterministic BLAKE3 digest over every row, for provenance logging.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for name in &self.indicator_names {
            hasher.update(name.as_bytes());
        }
        for row in &self.rows {
            hasher.update(row.ticker.as_bytes());
            hasher.update(row.date.to_string().as_bytes());
            for v in [
                row.open,
                row.high,
                row.low,
                row.close,
                row.adj_close,
                row.volume,
            ] {
                hasher.update(&v.to_le_bytes());
            }
            for v in &row.indicators {
                hasher.update(&v.to_le_bytes());
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}
