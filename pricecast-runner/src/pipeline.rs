//! Full train-and-backtest pipeline for one symbol.
//!
//! fetch → clean → indicators → split → fit → simulate → payloads.
//! Blocking from end to end; callers run it off the dispatch thread.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use pricecast_core::data::HistoryFetcher;
use pricecast_core::features::{DatasetSplitter, FeaturePreprocessor, IndicatorSource};
use pricecast_core::signal::SignalTranslator;

use crate::clock::Clock;
use crate::config::{ConfigError, ServiceConfig};
use crate::error::PipelineError;
use crate::payload::{BacktestPayload, PredictionPayload};
use crate::trainer::{Trainer, TrainingOrchestrator};

/// Both halves of a resolved symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub prediction: PredictionPayload,
    pub backtest: BacktestPayload,
}

/// Trimmed, uppercased symbol; empty input is `InvalidSymbol`.
pub fn normalize_symbol(symbol: &str) -> Result<String, PipelineError> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::InvalidSymbol);
    }
    Ok(trimmed.to_uppercase())
}

/// Start of the history window that ends at `end`.
pub(crate) fn window_start(
    end: DateTime<Utc>,
    lookback: Duration,
) -> Result<DateTime<Utc>, PipelineError> {
    end.checked_sub_signed(lookback).ok_or_else(|| {
        anyhow::anyhow!(
            "a {}-day history window before {end} is outside the calendar",
            lookback.num_days()
        )
        .into()
    })
}

pub struct PredictionPipeline<T: Trainer> {
    fetcher: Arc<dyn HistoryFetcher>,
    preprocessor: FeaturePreprocessor,
    splitter: DatasetSplitter,
    orchestrator: TrainingOrchestrator<T>,
    clock: Arc<dyn Clock>,
    lookback: Duration,
    min_training_rows: usize,
    history_points: usize,
}

impl<T: Trainer> PredictionPipeline<T> {
    pub fn new(
        config: &ServiceConfig,
        fetcher: Arc<dyn HistoryFetcher>,
        indicators: Arc<dyn IndicatorSource>,
        trainer: Arc<T>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            fetcher,
            preprocessor: FeaturePreprocessor::new(indicators),
            splitter: DatasetSplitter::new(config.service.test_window_days),
            orchestrator: TrainingOrchestrator::new(
                trainer,
                config.environment.clone(),
                config.service.training_timesteps,
            ),
            clock,
            lookback: config.lookback(),
            min_training_rows: config.service.min_training_rows,
            history_points: config.service.history_points,
        })
    }

    /// Run every stage for an already-normalized symbol.
    pub fn run(&self, symbol: &str) -> Result<Resolution, PipelineError> {
        let started = Instant::now();
        let end = self.clock.now();
        let start = window_start(end, self.lookback)?;

        let fetched = self.fetcher.fetch(symbol, start, end)?;
        if fetched.bars.is_empty() {
            return Err(PipelineError::NoData {
                symbol: symbol.to_string(),
            });
        }
        debug!(
            symbol,
            source = self.fetcher.name(),
            bars = fetched.bars.len(),
            "history fetched"
        );

        let clean = FeaturePreprocessor::clean_bars(&fetched.bars);
        let dataset = self
            .preprocessor
            .engineer(symbol, &clean, self.min_training_rows)?;
        let split = self.splitter.split(&dataset)?;
        debug!(
            symbol,
            train_rows = split.train.len(),
            test_rows = split.test.len(),
            split_date = %split.split_date,
            "dataset split"
        );

        let outcome = self.orchestrator.train_and_simulate(&split)?;
        let translator = SignalTranslator::new(outcome.env.hmax());
        let generated_at = self.clock.now();

        let prediction = PredictionPayload::build(
            symbol,
            &clean,
            outcome.trajectory.last_action(),
            &translator,
            self.history_points,
            generated_at,
        )?;
        let backtest = BacktestPayload::build(
            symbol,
            &outcome.trajectory,
            &split.test,
            &translator,
            generated_at,
        )?;

        info!(
            symbol,
            rows = dataset.len(),
            dataset_hash = %dataset.content_hash(),
            final_equity = backtest.metrics.final_equity,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pipeline complete"
        );
        Ok(Resolution {
            prediction,
            backtest,
        })
    }
}
