//! Service configuration, loaded from TOML and overlaid from `PRICECAST_*`
//! environment variables.
//!
//! ```toml
//! [service]
//! lookback_years = 2
//! test_window_days = 60
//!
//! [live]
//! model_path = "models/ppo_model.zip"
//! ```
//!
//! Missing sections and keys fall back to their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pricecast_core::data::yahoo::DEFAULT_CHART_URL;
use pricecast_core::data::{DataError, YahooProvider};

/// Upper bound of `service.lookback_years`.
pub const MAX_LOOKBACK_YEARS: u32 = 100;
/// Upper bound of `service.test_window_days` and `live.lookback_days`.
pub const MAX_WINDOW_DAYS: u32 = 36_500;
/// Upper bound of `service.cache_ttl_minutes`: ten years.
pub const MAX_CACHE_TTL_MINUTES: u64 = 10 * 365 * 24 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("environment variable {var} has invalid value '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    #[error("{0} must be positive")]
    NonPositive(&'static str),

    #[error("{0} is out of range")]
    OutOfRange(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub service: PipelineSettings,
    pub live: LiveSettings,
    pub environment: EnvironmentSettings,
    pub provider: ProviderSettings,
}

/// Knobs of the full train-and-backtest pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub lookback_years: u32,
    pub test_window_days: u32,
    pub training_timesteps: u64,
    pub cache_ttl_minutes: u64,
    pub min_training_rows: usize,
    pub history_points: usize,
    /// Threads of the resolver pool.
    pub worker_threads: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            lookback_years: 2,
            test_window_days: 60,
            training_timesteps: 10_000,
            cache_ttl_minutes: 60,
            min_training_rows: 100,
            history_points: 240,
            worker_threads: 4,
        }
    }
}

/// The prediction-only path that reuses a persisted policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveSettings {
    pub model_path: PathBuf,
    pub lookback_days: u32,
    pub min_rows: usize,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("ppo_model.zip"),
            lookback_days: 365,
            min_rows: 30,
        }
    }
}

/// Trading environment parameters handed to the trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    pub hmax: u32,
    pub initial_amount: f64,
    /// Applied to both buys and sells of every stock.
    pub transaction_cost_pct: f64,
    pub reward_scaling: f64,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            hmax: 100,
            initial_amount: 100_000.0,
            transaction_cost_pct: 0.001,
            reward_scaling: 1e-4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub chart_url: String,
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            chart_url: DEFAULT_CHART_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay `PRICECAST_*` variables from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|var| std::env::var(var).ok())
    }

    /// Overlay values from any variable lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(
            var: &'static str,
            raw: Option<String>,
        ) -> Result<Option<T>, ConfigError> {
            match raw {
                None => Ok(None),
                Some(value) => value
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|_| ConfigError::InvalidEnv { var, value }),
            }
        }

        const LOOKBACK: &str = "PRICECAST_LOOKBACK_YEARS";
        const WINDOW: &str = "PRICECAST_TEST_WINDOW_DAYS";
        const TIMESTEPS: &str = "PRICECAST_TRAINING_TIMESTEPS";
        const TTL: &str = "PRICECAST_CACHE_TTL_MINUTES";

        if let Some(v) = parse(LOOKBACK, lookup(LOOKBACK))? {
            self.service.lookback_years = v;
        }
        if let Some(v) = parse(WINDOW, lookup(WINDOW))? {
            self.service.test_window_days = v;
        }
        if let Some(v) = parse(TIMESTEPS, lookup(TIMESTEPS))? {
            self.service.training_timesteps = v;
        }
        if let Some(v) = parse(TTL, lookup(TTL))? {
            self.service.cache_ttl_minutes = v;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.service;
        let positive = [
            ("service.lookback_years", s.lookback_years as u64),
            ("service.test_window_days", s.test_window_days as u64),
            ("service.training_timesteps", s.training_timesteps),
            ("service.cache_ttl_minutes", s.cache_ttl_minutes),
            ("service.min_training_rows", s.min_training_rows as u64),
            ("service.history_points", s.history_points as u64),
            ("service.worker_threads", s.worker_threads as u64),
            ("live.lookback_days", self.live.lookback_days as u64),
            ("live.min_rows", self.live.min_rows as u64),
            ("environment.hmax", self.environment.hmax as u64),
            ("provider.timeout_secs", self.provider.timeout_secs),
        ];
        if let Some((field, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::NonPositive(*field));
        }

        let bounded = [
            ("service.lookback_years", u64::from(s.lookback_years), u64::from(MAX_LOOKBACK_YEARS)),
            ("service.test_window_days", u64::from(s.test_window_days), u64::from(MAX_WINDOW_DAYS)),
            ("service.cache_ttl_minutes", s.cache_ttl_minutes, MAX_CACHE_TTL_MINUTES),
            ("live.lookback_days", u64::from(self.live.lookback_days), u64::from(MAX_WINDOW_DAYS)),
        ];
        if let Some((field, _, _)) = bounded.iter().find(|(_, v, max)| v > max) {
            return Err(ConfigError::OutOfRange(*field));
        }

        let env = &self.environment;
        if !(env.initial_amount.is_finite() && env.initial_amount > 0.0) {
            return Err(ConfigError::NonPositive("environment.initial_amount"));
        }
        if !(env.transaction_cost_pct.is_finite() && env.transaction_cost_pct >= 0.0) {
            return Err(ConfigError::OutOfRange("environment.transaction_cost_pct"));
        }
        if !(env.reward_scaling.is_finite() && env.reward_scaling > 0.0) {
            return Err(ConfigError::NonPositive("environment.reward_scaling"));
        }
        Ok(())
    }

    // The duration accessors clamp to the bounds `validate` enforces.

    /// History window of the full pipeline: 365 days per lookback year.
    pub fn lookback(&self) -> Duration {
        let years = self.service.lookback_years.min(MAX_LOOKBACK_YEARS);
        Duration::days(365 * i64::from(years))
    }

    pub fn live_lookback(&self) -> Duration {
        Duration::days(i64::from(self.live.lookback_days.min(MAX_WINDOW_DAYS)))
    }

    pub fn cache_ttl(&self) -> Duration {
        let minutes = self.service.cache_ttl_minutes.min(MAX_CACHE_TTL_MINUTES);
        Duration::minutes(minutes as i64)
    }

    pub fn provider_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.provider.timeout_secs)
    }

    /// The chart fetcher described by `[provider]`.
    pub fn yahoo_provider(&self) -> Result<YahooProvider, DataError> {
        YahooProvider::with_endpoint(&self.provider.chart_url, self.provider_timeout())
    }
}
