//! Synthetic history source for development, tests, and benches.
//!
//! Produces a random walk from a starting price of 100.0, seeded from the
//! symbol so the same request always yields the same bars. These are
//! clearly fake and tagged `DataSource::Synthetic`.

use super::provider::{validate_request, DataError, DataSource, FetchResult, HistoryFetcher};
use crate::domain::PriceBar;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic random-walk fetcher.
#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider {
    gap_every: Option<usize>,
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank the volume of every `n`-th bar, imitating upstream holes.
    pub fn with_gap_every(mut self, n: usize) -> Self {
        self.gap_every = (n > 0).then_some(n);
        self
    }
}

impl HistoryFetcher for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<FetchResult, DataError> {
        let symbol = validate_request(symbol, start, end)?;
        let mut bars = random_walk(symbol, start.date_naive(), end.date_naive());
        if let Some(n) = self.gap_every {
            for bar in bars.iter_mut().skip(n - 1).step_by(n) {
                bar.volume = None;
            }
        }
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::Synthetic,
        })
    }
}

/// Weekday bars on `[start, end)`.
fn random_walk(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current < end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64) as f64;

        bars.push(PriceBar {
            ticker: symbol.to_string(),
            date: current,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            adj_close: Some(close),
            volume: Some(volume),
        });

        price = close;
        current += Duration::days(1);
    }

    bars
}
