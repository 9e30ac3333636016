//! History fetcher trait and structured error types.
//!
//! The HistoryFetcher trait abstracts over price-history sources (Yahoo
//! Finance, the synthetic random walk) so the pipeline can swap
//! implementations and tests can run without a network.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PriceBar;

/// Structured error types for history fetching.
///
/// The first two are caller-correctable; the rest describe the upstream
/// source and are worth retrying later.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("symbol must not be empty")]
    InvalidSymbol,

    #[error("end ({end}) must be after start ({start})")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("rate limited by data provider, wait a moment and try again")]
    RateLimited,

    #[error("data provider unreachable: {0}")]
    Unreachable(String),

    #[error("data provider error: {0}")]
    ProviderError(String),
}

/// Where the bars came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    Synthetic,
}

/// Result of a successful fetch for a single symbol.
///
/// `bars` is sorted ascending by date and may be empty: whether an empty
/// history is fatal is the caller's call.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
    pub source: DataSource,
}

/// Trait for daily price-history sources.
pub trait HistoryFetcher: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch daily bars for `symbol` over `[start, end)`.
    fn fetch(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<FetchResult, DataError>;
}

/// Argument checks shared by every fetcher. Returns the trimmed symbol.
pub(crate) fn validate_request<'a>(
    symbol: &'a str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<&'a str, DataError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(DataError::InvalidSymbol);
    }
    if end <= start {
        return Err(DataError::InvalidRange { start, end });
    }
    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn rejects_blank_symbol() {
        let now = Utc::now();
        let err = validate_request("   ", now, now + Duration::days(1)).unwrap_err();
        assert!(matches!(err, DataError::InvalidSymbol));
    }

    #[test]
    fn rejects_empty_and_inverted_ranges() {
        let now = Utc::now();
        assert!(matches!(
            validate_request("SPY", now, now),
            Err(DataError::InvalidRange { .. })
        ));
        assert!(matches!(
            validate_request("SPY", now, now - Duration::days(1)),
            Err(DataError::InvalidRange { .. })
        ));
    }

    #[test]
    fn trims_symbol() {
        let now = Utc::now();
        let sym = validate_request(" aapl ", now, now + Duration::days(1)).unwrap();
        assert_eq!(sym, "aapl");
    }
}
