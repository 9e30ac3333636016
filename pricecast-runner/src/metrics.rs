//! Backtest metrics: pure functions over a simulated equity curve.
//!
//! Every metric is a pure function: equity values in, scalar out. Only
//! [`BacktestMetrics::compute`] rounds, for display.

use serde::{Deserialize, Serialize};

use pricecast_core::domain::AccountRecord;

/// Trading days per year used to annualize daily statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Display-ready statistics for one backtest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestMetrics {
    pub final_equity: f64,
    pub total_return_pct: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
}

impl BacktestMetrics {
    /// `None` for an empty curve.
    pub fn compute(accounts: &[AccountRecord]) -> Option<Self> {
        let equity: Vec<f64> = accounts.iter().map(|a| a.account_value).collect();
        let final_equity = *equity.last()?;
        Some(Self {
            final_equity: round_to(final_equity, 2),
            total_return_pct: round_to(total_return(&equity) * 100.0, 2),
            sharpe_ratio: round_to(sharpe_ratio(&equity), 3),
            max_drawdown_pct: round_to(max_drawdown(&equity) * 100.0, 2),
        })
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: final / first − 1.
///
/// 0.0 for an empty curve or a zero starting value.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    let (Some(&first), Some(&last)) = (equity_curve.first(), equity_curve.last()) else {
        return 0.0;
    };
    if first == 0.0 {
        return 0.0;
    }
    last / first - 1.0
}

/// Annualized Sharpe ratio from daily returns, risk-free rate 0.
///
/// Sharpe = mean(daily returns) / std(daily returns) * sqrt(252).
/// Returns 0.0 with fewer than 2 returns or zero variance.
pub fn sharpe_ratio(equity_curve: &[f64]) -> f64 {
    let returns = daily_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(&returns);
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if equity is constant or monotonically increasing.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0];
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Simple returns between consecutive equity values.
///
/// A step starting from zero equity counts as a 0 return.
pub fn daily_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| if w[0] != 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Round to `decimals` places.
///
/// Exact ties round away from zero (`0.125` → `0.13`), not to even.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
