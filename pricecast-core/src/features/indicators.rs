//! Indicator computation boundary.
//!
//! Technical-indicator math lives outside this crate. An `IndicatorSource`
//! takes cleaned bars and hands back one column per indicator, aligned
//! row-for-row with the input. Cells may be missing (warm-up periods);
//! the preprocessor fills or drops them.

use crate::domain::CleanBar;
use anyhow::{bail, Result};

/// Indicator set the policy environment is built around by default.
pub const DEFAULT_INDICATORS: [&str; 8] = [
    "macd",
    "boll_ub",
    "boll_lb",
    "rsi_30",
    "cci_30",
    "dx_30",
    "close_30_sma",
    "close_60_sma",
];

/// Named indicator columns, one `Vec` per indicator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndicatorFrame {
    names: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl IndicatorFrame {
    /// Fails if names and columns disagree in count or columns differ in length.
    pub fn new(names: Vec<String>, columns: Vec<Vec<Option<f64>>>) -> Result<Self> {
        if names.len() != columns.len() {
            bail!(
                "indicator frame has {} names but {} columns",
                names.len(),
                columns.len()
            );
        }
        if let Some(first) = columns.first() {
            if let Some((i, _)) = columns
                .iter()
                .enumerate()
                .find(|(_, c)| c.len() != first.len())
            {
                bail!("indicator column '{}' has a different length", names[i]);
            }
        }
        Ok(Self { names, columns })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> &[Vec<Option<f64>>] {
        &self.columns
    }

    /// Row count, or `None` for a frame without columns.
    pub fn row_count(&self) -> Option<usize> {
        self.columns.first().map(Vec::len)
    }

    pub fn into_columns(self) -> Vec<Vec<Option<f64>>> {
        self.columns
    }
}

/// External indicator capability.
pub trait IndicatorSource: Send + Sync {
    /// Names of the columns `compute` returns, in order.
    fn indicator_names(&self) -> Vec<String>;

    /// Compute every indicator over `bars` (one ticker, date-ascending).
    fn compute(&self, bars: &[CleanBar]) -> Result<IndicatorFrame>;
}
