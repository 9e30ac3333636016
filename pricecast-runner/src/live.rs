//! Prediction-only path: replay the persisted policy over recent history.
//!
//! Nothing is trained and nothing is cached. The latest action drives a
//! single next-day prediction.

use std::sync::Arc;

use chrono::Duration;
use tracing::info;

use pricecast_core::data::HistoryFetcher;
use pricecast_core::domain::RawAction;
use pricecast_core::features::{FeaturePreprocessor, IndicatorSource};
use pricecast_core::signal::SignalTranslator;

use crate::clock::Clock;
use crate::config::{ConfigError, ServiceConfig};
use crate::error::PipelineError;
use crate::payload::{LivePrediction, PredictionPayload};
use crate::pipeline::{normalize_symbol, window_start};
use crate::policy_store::PolicyStore;
use crate::trainer::{Trainer, TrainingOrchestrator};

pub struct LivePredictor<T: Trainer> {
    fetcher: Arc<dyn HistoryFetcher>,
    preprocessor: FeaturePreprocessor,
    orchestrator: TrainingOrchestrator<T>,
    store: Arc<PolicyStore<T>>,
    clock: Arc<dyn Clock>,
    lookback: Duration,
    min_rows: usize,
    history_points: usize,
}

impl<T: Trainer> LivePredictor<T> {
    pub fn new(
        config: &ServiceConfig,
        fetcher: Arc<dyn HistoryFetcher>,
        indicators: Arc<dyn IndicatorSource>,
        store: Arc<PolicyStore<T>>,
        trainer: Arc<T>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            fetcher,
            preprocessor: FeaturePreprocessor::new(indicators),
            orchestrator: TrainingOrchestrator::new(
                trainer,
                config.environment.clone(),
                config.service.training_timesteps,
            ),
            store,
            clock,
            lookback: config.live_lookback(),
            min_rows: config.live.min_rows,
            history_points: config.service.history_points,
        })
    }

    pub fn predict(&self, symbol: &str) -> Result<LivePrediction, PipelineError> {
        let symbol = normalize_symbol(symbol)?;
        let policy = self.store.load()?;

        let end = self.clock.now();
        let fetched = self
            .fetcher
            .fetch(&symbol, window_start(end, self.lookback)?, end)?;
        if fetched.bars.is_empty() {
            return Err(PipelineError::NoData { symbol });
        }
        let clean = FeaturePreprocessor::clean_bars(&fetched.bars);
        // Checked on the cleaned bars and again after the warm-up rows drop.
        let dataset = self.preprocessor.engineer(&symbol, &clean, self.min_rows)?;
        let env = self.orchestrator.environment_for(&dataset)?;
        let trajectory = self
            .orchestrator
            .trainer()
            .simulate(&policy, &env, &dataset)?;
        let action = trajectory
            .last_action()
            .cloned()
            .unwrap_or(RawAction::Scalar(0.0));

        let prediction = PredictionPayload::build(
            &symbol,
            &clean,
            Some(&action),
            &SignalTranslator::new(env.hmax()),
            self.history_points,
            self.clock.now(),
        )?;
        let live = LivePrediction::new(prediction);
        info!(
            symbol = %symbol,
            latest_close = live.prediction.latest_close,
            predicted = live.prediction.predicted_next_close,
            "live prediction"
        );
        Ok(live)
    }
}
