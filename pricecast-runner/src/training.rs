//! Offline job that fits a policy on recent history and persists it for the
//! live prediction path.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::info;

use pricecast_core::data::HistoryFetcher;
use pricecast_core::features::{FeaturePreprocessor, IndicatorSource};

use crate::clock::Clock;
use crate::config::{ConfigError, ServiceConfig};
use crate::error::PipelineError;
use crate::pipeline::{normalize_symbol, window_start};
use crate::trainer::{Trainer, TrainingOrchestrator};

/// What a training run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub symbol: String,
    pub rows: usize,
    pub timesteps: u64,
    pub artifact: PathBuf,
    /// blake3 of the artifact bytes.
    pub fingerprint: String,
}

pub struct PolicyTrainingJob<T: Trainer> {
    fetcher: Arc<dyn HistoryFetcher>,
    preprocessor: FeaturePreprocessor,
    orchestrator: TrainingOrchestrator<T>,
    clock: Arc<dyn Clock>,
    lookback: Duration,
    output: PathBuf,
}

impl<T: Trainer> PolicyTrainingJob<T> {
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
            orchestrator: TrainingOrchestrator::new(
                trainer,
                config.environment.clone(),
                config.service.training_timesteps,
            ),
            clock,
            lookback: config.live_lookback(),
            output: config.live.model_path.clone(),
        })
    }

    /// Write the artifact somewhere other than the configured model path.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Fetch, fit on the whole history, and persist the policy.
    pub fn run(&self, symbol: &str) -> Result<TrainingReport, PipelineError> {
        let symbol = normalize_symbol(symbol)?;
        let end = self.clock.now();
        let fetched = self
            .fetcher
            .fetch(&symbol, window_start(end, self.lookback)?, end)?;
        if fetched.bars.is_empty() {
            return Err(PipelineError::NoData { symbol });
        }

        let clean = FeaturePreprocessor::clean_bars(&fetched.bars);
        let dataset = self.preprocessor.engineer(&symbol, &clean, 1)?;
        let env = self.orchestrator.environment_for(&dataset)?;
        info!(
            symbol = %symbol,
            rows = dataset.len(),
            timesteps = self.orchestrator.timesteps(),
            "training policy"
        );
        let policy = self.orchestrator.fit(&env, &dataset)?;
        let bytes = self.orchestrator.trainer().encode_policy(&policy)?;
        write_atomic(&self.output, &bytes)?;

        let fingerprint = blake3::hash(&bytes).to_hex().to_string();
        info!(
            path = %self.output.display(),
            bytes = bytes.len(),
            fingerprint = %fingerprint,
            "policy artifact written"
        );
        Ok(TrainingReport {
            symbol,
            rows: dataset.len(),
            timesteps: self.orchestrator.timesteps(),
            artifact: self.output.clone(),
            fingerprint,
        })
    }
}

/// Write to a sibling `.tmp` file, then rename into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("create artifact directory {}", dir.display()))?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, bytes)
        .with_context(|| format!("write temporary artifact {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        anyhow::Error::new(e).context(format!("atomic rename to {} failed", path.display()))
    })
}
