//! Per-symbol result cache with a time-to-live.
//!
//! The map lock is held only to look up or to insert. The pipeline itself
//! runs unlocked, so two concurrent misses for one symbol both compute and
//! the later insert wins. Stale entries are never swept; the next miss for
//! the symbol overwrites them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::PipelineError;
use crate::payload::{BacktestPayload, PredictionPayload};
use crate::pipeline::{normalize_symbol, Resolution};

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Uppercased.
    pub symbol: String,
    pub prediction: PredictionPayload,
    pub backtest: BacktestPayload,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn resolution(&self) -> Resolution {
        Resolution {
            prediction: self.prediction.clone(),
            backtest: self.backtest.clone(),
        }
    }
}

pub struct PredictionCache {
    entries: Mutex<HashMap<String, Arc<CacheEntry>>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl PredictionCache {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<CacheEntry>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The unexpired entry for `symbol`, if any.
    pub fn get(&self, symbol: &str) -> Option<Arc<CacheEntry>> {
        let key = symbol.trim().to_uppercase();
        let now = self.clock.now();
        self.entries()
            .get(&key)
            .filter(|entry| entry.is_fresh(now))
            .cloned()
    }

    /// Store a fresh result, replacing whatever was there.
    pub fn insert(&self, symbol: &str, resolution: Resolution) -> Arc<CacheEntry> {
        let key = symbol.trim().to_uppercase();
        let now = self.clock.now();
        let entry = Arc::new(CacheEntry {
            symbol: key.clone(),
            prediction: resolution.prediction,
            backtest: resolution.backtest,
            expires_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        });

        let previous = self.entries().insert(key, Arc::clone(&entry));
        if previous.is_some_and(|p| p.is_fresh(now)) {
            warn!(symbol = %entry.symbol, "replaced a fresh entry stored by a concurrent miss");
        }
        entry
    }

    /// Cached result for `symbol`, or run `compute` and cache its result.
    ///
    /// `compute` receives the normalized symbol. Errors are never cached.
    pub fn get_or_compute<F>(&self, symbol: &str, compute: F) -> Result<Arc<CacheEntry>, PipelineError>
    where
        F: FnOnce(&str) -> Result<Resolution, PipelineError>,
    {
        let key = normalize_symbol(symbol)?;
        if let Some(entry) = self.get(&key) {
            info!(symbol = %key, expires_at = %entry.expires_at, "cache hit");
            return Ok(entry);
        }

        info!(symbol = %key, "cache miss");
        let resolution = compute(&key)?;
        Ok(self.insert(&key, resolution))
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
