//! Shared fakes for the external capabilities: history, indicators, trainer.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use anyhow::{anyhow, bail};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use pricecast_core::data::{DataError, DataSource, FetchResult, HistoryFetcher};
use pricecast_core::domain::{
    AccountRecord, ActionRecord, CleanBar, Dataset, PriceBar, RawAction, Trajectory,
};
use pricecast_core::features::{IndicatorFrame, IndicatorSource, DEFAULT_INDICATORS};
use pricecast_runner::{EnvironmentConfig, ManualClock, ServiceConfig, Trainer};

/// Equity added per simulated step. Cent-valued, so rounding for display
/// leaves it unchanged.
pub const EQUITY_STEP: f64 = 12.5;

pub fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(start_instant()))
}

pub fn last_bar_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()
}

/// `n` consecutive calendar days ending at [`last_bar_date`].
pub fn daily_bars(n: usize) -> Vec<PriceBar> {
    let first = last_bar_date() - Duration::days(n as i64 - 1);
    (0..n)
        .map(|i| {
            let close = ((100.0 + 8.0 * (i as f64 / 9.0).sin()) * 100.0).round() / 100.0;
            PriceBar {
                ticker: String::new(),
                date: first + Duration::days(i as i64),
                open: Some(close - 0.5),
                high: Some(close + 1.0),
                low: Some(close - 1.0),
                close: Some(close),
                adj_close: Some(close),
                volume: Some(1_000_000.0 + i as f64),
            }
        })
        .collect()
}

pub fn config() -> ServiceConfig {
    ServiceConfig::default()
}

// ── History ──────────────────────────────────────────────────────────

/// Serves the same bars for every symbol and counts requests.
pub struct FixedHistory {
    bars: Vec<PriceBar>,
    calls: AtomicUsize,
}

impl FixedHistory {
    pub fn new(bars: Vec<PriceBar>) -> Arc<Self> {
        Arc::new(Self {
            bars,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HistoryFetcher for FixedHistory {
    fn name(&self) -> &str {
        "fixed"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<FetchResult, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if end <= start {
            return Err(DataError::InvalidRange { start, end });
        }
        let bars = self
            .bars
            .iter()
            .cloned()
            .map(|mut b| {
                b.ticker = symbol.to_string();
                b
            })
            .collect();
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::Synthetic,
        })
    }
}

/// Fails every request with the error `make` builds.
pub struct FailingHistory {
    pub make: fn() -> DataError,
}

impl HistoryFetcher for FailingHistory {
    fn name(&self) -> &str {
        "failing"
    }

    fn fetch(&self, _: &str, _: DateTime<Utc>, _: DateTime<Utc>) -> Result<FetchResult, DataError> {
        Err((self.make)())
    }
}

// ── Indicators ───────────────────────────────────────────────────────

/// Scaled closes under the standard indicator names, blank for the first
/// `warmup` rows.
pub struct FakeIndicators {
    pub warmup: usize,
}

impl FakeIndicators {
    pub fn new(warmup: usize) -> Arc<Self> {
        Arc::new(Self { warmup })
    }
}

impl IndicatorSource for FakeIndicators {
    fn indicator_names(&self) -> Vec<String> {
        DEFAULT_INDICATORS.iter().map(|s| s.to_string()).collect()
    }

    fn compute(&self, bars: &[CleanBar]) -> anyhow::Result<IndicatorFrame> {
        let columns = (0..DEFAULT_INDICATORS.len())
            .map(|k| {
                bars.iter()
                    .enumerate()
                    .map(|(i, b)| (i >= self.warmup).then(|| b.close * (1.0 + k as f64 / 100.0)))
                    .collect()
            })
            .collect();
        IndicatorFrame::new(self.indicator_names(), columns)
    }
}

// ── Trainer ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakePolicy {
    pub action_scale: f64,
}

/// Deterministic trainer: equity grows by [`EQUITY_STEP`] per date and the
/// actions cycle through −3..=3 times the policy scale.
#[derive(Default)]
pub struct FakeTrainer {
    fits: AtomicUsize,
    simulations: AtomicUsize,
    fail_fit: Option<String>,
    rendezvous: Option<Arc<Barrier>>,
    empty_curve: bool,
}

impl FakeTrainer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_fit: Some(message.to_string()),
            ..Self::default()
        })
    }

    /// Every `fit` waits until `parties` fits are in flight.
    pub fn rendezvous(parties: usize) -> Arc<Self> {
        Arc::new(Self {
            rendezvous: Some(Arc::new(Barrier::new(parties))),
            ..Self::default()
        })
    }

    pub fn empty_curve() -> Arc<Self> {
        Arc::new(Self {
            empty_curve: true,
            ..Self::default()
        })
    }

    pub fn fits(&self) -> usize {
        self.fits.load(Ordering::SeqCst)
    }

    pub fn simulations(&self) -> usize {
        self.simulations.load(Ordering::SeqCst)
    }
}

impl Trainer for FakeTrainer {
    type Policy = FakePolicy;

    fn fit(
        &self,
        env: &EnvironmentConfig,
        train: &Dataset,
        timesteps: u64,
    ) -> anyhow::Result<FakePolicy> {
        self.fits.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.rendezvous {
            barrier.wait();
        }
        if let Some(message) = &self.fail_fit {
            bail!("{message}");
        }
        if train.is_empty() || env.stock_dim() == 0 {
            return Err(anyhow!("nothing to train on"));
        }
        Ok(FakePolicy {
            action_scale: timesteps as f64 / 100.0,
        })
    }

    fn simulate(
        &self,
        policy: &FakePolicy,
        env: &EnvironmentConfig,
        dataset: &Dataset,
    ) -> anyhow::Result<Trajectory> {
        self.simulations.fetch_add(1, Ordering::SeqCst);
        if self.empty_curve {
            return Ok(Trajectory::default());
        }
        let mut dates: Vec<NaiveDate> = dataset.rows().iter().map(|r| r.date).collect();
        dates.dedup();

        let accounts = dates
            .iter()
            .enumerate()
            .map(|(i, &date)| AccountRecord {
                date,
                account_value: env.initial_amount() + EQUITY_STEP * i as f64,
            })
            .collect();
        let actions = dates
            .iter()
            .enumerate()
            .map(|(i, &date)| {
                let a = policy.action_scale * ((i % 7) as f64 - 3.0);
                ActionRecord {
                    date,
                    action: if i % 2 == 0 {
                        RawAction::Scalar(a)
                    } else {
                        RawAction::Sequence(vec![a, -a])
                    },
                }
            })
            .collect();
        Ok(Trajectory { accounts, actions })
    }

    fn encode_policy(&self, policy: &FakePolicy) -> anyhow::Result<Vec<u8>> {
        Ok(serde_json::to_vec(policy)?)
    }

    fn decode_policy(&self, bytes: &[u8]) -> anyhow::Result<FakePolicy> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
