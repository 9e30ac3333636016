//! Yahoo Finance history fetcher.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API with one request per
//! call. A single HTTP client with browser-like headers is reused for every
//! request; Yahoo throttles bare clients aggressively.
//!
//! No retries happen here. A 429 surfaces as `RateLimited` and the caller
//! decides what to do with it.

use super::align::align_length;
use super::provider::{validate_request, DataError, DataSource, FetchResult, HistoryFetcher};
use crate::domain::PriceBar;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

/// Chart endpoint; the symbol is appended as a path segment.
pub const DEFAULT_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Socket-level bound on a single chart request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

/// Yahoo Finance v8 chart API response. Every level is optional; a
/// missing piece reads as "no data", not as a format error.
#[derive(Debug, Default, Deserialize)]
struct ChartResponse {
    #[serde(default)]
    chart: ChartBody,
}

#[derive(Debug, Default, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartData>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Option<Vec<QuoteData>>,
    #[serde(default)]
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Option<Vec<Option<f64>>>,
    #[serde(default)]
    high: Option<Vec<Option<f64>>>,
    #[serde(default)]
    low: Option<Vec<Option<f64>>>,
    #[serde(default)]
    close: Option<Vec<Option<f64>>>,
    #[serde(default)]
    volume: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Default, Deserialize)]
struct AdjCloseData {
    #[serde(default)]
    adjclose: Option<Vec<Option<f64>>>,
}

/// Yahoo Finance history fetcher.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    chart_url: Url,
}

impl YahooProvider {
    /// Provider against the public endpoint with the default timeout.
    pub fn new() -> Result<Self, DataError> {
        Self::with_endpoint(DEFAULT_CHART_URL, DEFAULT_TIMEOUT)
    }

    /// Provider against an arbitrary chart endpoint (mirrors, local test servers).
    pub fn with_endpoint(chart_url: &str, timeout: Duration) -> Result<Self, DataError> {
        let chart_url = Url::parse(chart_url)
            .map_err(|e| DataError::Unreachable(format!("invalid chart url '{chart_url}': {e}")))?;
        if chart_url.cannot_be_a_base() {
            return Err(DataError::Unreachable(format!(
                "chart url '{chart_url}' cannot take a symbol path"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json,text/javascript,*/*;q=0.01"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| DataError::Unreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, chart_url })
    }

    /// Chart URL for a symbol, percent-encoded as a single path segment.
    fn symbol_url(&self, symbol: &str) -> Result<Url, DataError> {
        let mut url = self.chart_url.clone();
        url.path_segments_mut()
            .map_err(|_| DataError::Unreachable("chart url cannot take a symbol path".into()))?
            .pop_if_empty()
            .push(symbol);
        Ok(url)
    }
}

impl HistoryFetcher for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<FetchResult, DataError> {
        let symbol = validate_request(symbol, start, end)?;
        let url = self.symbol_url(symbol)?;
        let period1 = start.timestamp();
        let period2 = end.timestamp();

        tracing::debug!(symbol, period1, period2, "requesting daily chart");

        let resp = self
            .client
            .get(url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("includePrePost", "false".to_string()),
                ("events", "div,splits".to_string()),
                ("lang", "en-US".to_string()),
                ("region", "US".to_string()),
            ])
            .send()
            .map_err(|e| DataError::Unreachable(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(symbol, "chart request rate limited");
            return Err(DataError::RateLimited);
        }
        let body = resp
            .text()
            .map_err(|e| DataError::Unreachable(format!("failed to read response body: {e}")))?;

        let bars = decode_chart(symbol, status, &body)?;
        tracing::debug!(symbol, bars = bars.len(), "chart decoded");

        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::YahooFinance,
        })
    }
}

/// Turn an HTTP status and body into date-sorted bars.
///
/// An explicit `chart.error` wins over the status code so unknown symbols
/// (served as 404 with an error object) report the provider's message.
fn decode_chart(symbol: &str, status: StatusCode, body: &str) -> Result<Vec<PriceBar>, DataError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(DataError::RateLimited);
    }

    let parsed: ChartResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(_) if !status.is_success() => {
            return Err(DataError::Unreachable(format!("HTTP {status} for {symbol}")));
        }
        Err(e) => {
            return Err(DataError::Unreachable(format!(
                "response for {symbol} is not JSON: {e}"
            )));
        }
    };

    if let Some(err) = parsed.chart.error {
        let description = err
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "Unknown Yahoo Finance error.".to_string());
        tracing::warn!(symbol, %description, "provider returned an error object");
        return Err(DataError::ProviderError(description));
    }

    if !status.is_success() {
        return Err(DataError::Unreachable(format!("HTTP {status} for {symbol}")));
    }

    let Some(data) = parsed.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let timestamps = data.timestamp.unwrap_or_default();
    if timestamps.is_empty() {
        return Ok(Vec::new());
    }

    let indicators = data.indicators.unwrap_or_default();
    let quote = indicators
        .quote
        .and_then(|q| q.into_iter().next())
        .unwrap_or_default();
    let adj_series = indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .and_then(|a| a.adjclose);

    let n = timestamps.len();
    let opens = align_length(quote.open.as_deref(), n);
    let highs = align_length(quote.high.as_deref(), n);
    let lows = align_length(quote.low.as_deref(), n);
    let closes = align_length(quote.close.as_deref(), n);
    let volumes = align_length(quote.volume.as_deref(), n);
    let adj_closes = match adj_series.as_deref() {
        Some(series) => align_length(Some(series), n),
        None => closes.clone(),
    };

    let mut bars = Vec::with_capacity(n);
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| DataError::ProviderError(format!("invalid timestamp: {ts}")))?;
        bars.push(PriceBar {
            ticker: symbol.to_string(),
            date,
            open: opens[i],
            high: highs[i],
            low: lows[i],
            close: closes[i],
            adj_close: adj_closes[i],
            volume: volumes[i],
        });
    }
    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // 2024-01-02 .. 2024-01-06, 14:30 UTC
    const TS: [i64; 5] = [
        1_704_205_800,
        1_704_292_200,
        1_704_378_600,
        1_704_465_000,
        1_704_551_400,
    ];

    fn body(quote: &str, adjclose: &str) -> String {
        format!(
            r#"{{"chart":{{"result":[{{"meta":{{"symbol":"SPY"}},
                "timestamp":[{},{},{},{},{}],
                "indicators":{{"quote":[{quote}]{adjclose}}}}}],"error":null}}}}"#,
            TS[0], TS[1], TS[2], TS[3], TS[4]
        )
    }

    #[test]
    fn short_close_column_pads_with_nulls() {
        let b = body(
            r#"{"open":[1,2,3,4,5],"high":[1,2,3,4,5],"low":[1,2,3,4,5],
                "close":[10.0,11.0,12.0],"volume":[100,200,300,400,500]}"#,
            "",
        );
        let bars = decode_chart("SPY", StatusCode::OK, &b).unwrap();
        assert_eq!(bars.len(), 5);
        let closes: Vec<_> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![Some(10.0), Some(11.0), Some(12.0), None, None]);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn adj_close_falls_back_to_aligned_close() {
        let b = body(r#"{"close":[1.0,2.0,3.0,4.0,5.0,6.0]}"#, "");
        let bars = decode_chart("SPY", StatusCode::OK, &b).unwrap();
        assert_eq!(bars.len(), 5);
        for bar in &bars {
            assert_eq!(bar.adj_close, bar.close);
            assert!(bar.open.is_none());
            assert!(bar.volume.is_none());
        }
    }

    #[test]
    fn adj_close_uses_provider_series_when_present() {
        let b = body(
            r#"{"close":[1.0,2.0,3.0,4.0,5.0]}"#,
            r#","adjclose":[{"adjclose":[0.5,1.5]}]"#,
        );
        let bars = decode_chart("SPY", StatusCode::OK, &b).unwrap();
        let adj: Vec<_> = bars.iter().map(|b| b.adj_close).collect();
        assert_eq!(adj, vec![Some(0.5), Some(1.5), None, None, None]);
    }

    #[test]
    fn provider_error_object_wins_over_status() {
        let b = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        for status in [StatusCode::OK, StatusCode::NOT_FOUND] {
            match decode_chart("ZZZZ", status, b) {
                Err(DataError::ProviderError(msg)) => assert!(msg.contains("delisted")),
                other => panic!("expected ProviderError, got {other:?}"),
            }
        }
    }

    #[test]
    fn non_json_body_is_unreachable() {
        let err = decode_chart("SPY", StatusCode::OK, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, DataError::Unreachable(_)));
        let err = decode_chart("SPY", StatusCode::BAD_GATEWAY, "bad gateway").unwrap_err();
        assert!(matches!(err, DataError::Unreachable(_)));
    }

    #[test]
    fn rate_limit_status() {
        let err = decode_chart("SPY", StatusCode::TOO_MANY_REQUESTS, "").unwrap_err();
        assert!(matches!(err, DataError::RateLimited));
    }

    #[test]
    fn empty_results_are_not_errors() {
        let empty_result = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(decode_chart("SPY", StatusCode::OK, empty_result)
            .unwrap()
            .is_empty());
        let no_timestamps = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(decode_chart("SPY", StatusCode::OK, no_timestamps)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn bars_come_back_sorted() {
        let b = format!(
            r#"{{"chart":{{"result":[{{"timestamp":[{},{}],
                "indicators":{{"quote":[{{"close":[2.0,1.0]}}]}}}}]}}}}"#,
            TS[1], TS[0]
        );
        let bars = decode_chart("SPY", StatusCode::OK, &b).unwrap();
        assert_eq!(bars[0].close, Some(1.0));
        assert!(bars[0].date < bars[1].date);
    }

    #[test]
    fn symbol_is_encoded_as_path_segment() {
        let provider =
            YahooProvider::with_endpoint("http://127.0.0.1:9/v8/finance/chart/", DEFAULT_TIMEOUT)
                .unwrap();
        let url = provider.symbol_url("BRK/B").unwrap();
        assert_eq!(url.path(), "/v8/finance/chart/BRK%2FB");
    }
}
