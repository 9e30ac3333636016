//! Simulation output: per-step actions and the equity curve.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A policy action as emitted by the trainer.
///
/// Multi-asset policies emit one value per stock; only the first is used
/// downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAction {
    Scalar(f64),
    Sequence(Vec<f64>),
}

impl RawAction {
    /// First element of a sequence, 0 for an empty one, or the scalar itself.
    pub fn scalar(&self) -> f64 {
        match self {
            RawAction::Scalar(v) => *v,
            RawAction::Sequence(values) => values.first().copied().unwrap_or(0.0),
        }
    }
}

impl From<f64> for RawAction {
    fn from(v: f64) -> Self {
        RawAction::Scalar(v)
    }
}

impl From<Vec<f64>> for RawAction {
    fn from(values: Vec<f64>) -> Self {
        RawAction::Sequence(values)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub date: NaiveDate,
    pub action: RawAction,
}

/// One point of the simulated equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub date: NaiveDate,
    pub account_value: f64,
}

/// Everything a policy replay over a dataset produces.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trajectory {
    pub accounts: Vec<AccountRecord>,
    pub actions: Vec<ActionRecord>,
}

impl Trajectory {
    /// True when account dates strictly increase.
    pub fn is_date_ordered(&self) -> bool {
        self.accounts.windows(2).all(|w| w[0].date < w[1].date)
    }

    pub fn last_action(&self) -> Option<&RawAction> {
        self.actions.last().map(|a| &a.action)
    }
}
