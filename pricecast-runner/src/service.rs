//! `resolve(symbol)`: the single operation the request layer calls.
//!
//! [`PredictionService`] puts the cache in front of the pipeline.
//! [`ResolverPool`] runs it on a private rayon pool and answers through
//! `mpsc` channels, so the dispatch thread never blocks on a pipeline run.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use anyhow::Context;

use pricecast_core::data::HistoryFetcher;
use pricecast_core::features::IndicatorSource;

use crate::cache::PredictionCache;
use crate::clock::Clock;
use crate::config::{ConfigError, ServiceConfig};
use crate::error::PipelineError;
use crate::payload::{BacktestPayload, PredictionPayload};
use crate::pipeline::{PredictionPipeline, Resolution};
use crate::trainer::Trainer;

pub struct PredictionService<T: Trainer> {
    pipeline: PredictionPipeline<T>,
    cache: PredictionCache,
}

impl<T: Trainer> PredictionService<T> {
    pub fn new(pipeline: PredictionPipeline<T>, cache: PredictionCache) -> Self {
        Self { pipeline, cache }
    }

    /// Pipeline and cache wired from one configuration and one clock.
    pub fn from_config(
        config: &ServiceConfig,
        fetcher: Arc<dyn HistoryFetcher>,
        indicators: Arc<dyn IndicatorSource>,
        trainer: Arc<T>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let pipeline =
            PredictionPipeline::new(config, fetcher, indicators, trainer, Arc::clone(&clock))?;
        let cache = PredictionCache::new(clock, config.cache_ttl());
        Ok(Self::new(pipeline, cache))
    }

    pub fn resolve(&self, symbol: &str) -> Result<Resolution, PipelineError> {
        let entry = self
            .cache
            .get_or_compute(symbol, |normalized| self.pipeline.run(normalized))?;
        Ok(entry.resolution())
    }

    pub fn prediction(&self, symbol: &str) -> Result<PredictionPayload, PipelineError> {
        self.resolve(symbol).map(|r| r.prediction)
    }

    pub fn backtest(&self, symbol: &str) -> Result<BacktestPayload, PipelineError> {
        self.resolve(symbol).map(|r| r.backtest)
    }

    pub fn cache(&self) -> &PredictionCache {
        &self.cache
    }
}

/// Answer for one submitted symbol.
#[derive(Debug)]
pub struct ResolveResponse {
    pub symbol: String,
    pub result: Result<Resolution, PipelineError>,
}

pub struct ResolverPool<T: Trainer + 'static> {
    service: Arc<PredictionService<T>>,
    pool: rayon::ThreadPool,
}

impl<T: Trainer + 'static> ResolverPool<T> {
    pub fn new(service: Arc<PredictionService<T>>, threads: usize) -> anyhow::Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("pricecast-resolver-{i}"))
            .build()
            .context("failed to build resolver thread pool")?;
        Ok(Self { service, pool })
    }

    /// Pool sized by `service.worker_threads`.
    pub fn from_config(
        config: &ServiceConfig,
        service: Arc<PredictionService<T>>,
    ) -> anyhow::Result<Self> {
        Self::new(service, config.service.worker_threads)
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn service(&self) -> &Arc<PredictionService<T>> {
        &self.service
    }

    /// Queue `symbol`; the receiver yields exactly one response.
    pub fn submit(&self, symbol: impl Into<String>) -> Receiver<ResolveResponse> {
        let (tx, rx) = mpsc::channel();
        self.submit_to(symbol, tx);
        rx
    }

    /// Queue `symbol` and send the response on a shared channel.
    ///
    /// A dropped receiver discards the response.
    pub fn submit_to(&self, symbol: impl Into<String>, tx: Sender<ResolveResponse>) {
        let symbol = symbol.into();
        let service = Arc::clone(&self.service);
        self.pool.spawn(move || {
            let result = service.resolve(&symbol);
            let _ = tx.send(ResolveResponse { symbol, result });
        });
    }
}
