//! Training boundary: environment construction and delegation to the
//! external reinforcement-learning trainer.
//!
//! The trainer owns fitting and simulation. This layer builds the
//! environment description, hands datasets over, and checks that what comes
//! back is a usable trajectory. It never retries; a trainer failure surfaces
//! unchanged as `PipelineFailure`.

use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use pricecast_core::domain::{Dataset, Trajectory};
use pricecast_core::features::SplitDataset;

use crate::config::EnvironmentSettings;
use crate::error::PipelineError;

/// External capability that fits and replays trading policies.
///
/// Calls may run for minutes and must stay off request-dispatch threads.
pub trait Trainer: Send + Sync {
    type Policy: Send + Sync;

    /// Fit a policy on `train` for a budget of `timesteps`.
    fn fit(
        &self,
        env: &EnvironmentConfig,
        train: &Dataset,
        timesteps: u64,
    ) -> anyhow::Result<Self::Policy>;

    /// Replay `policy` over `dataset`, one step per date.
    fn simulate(
        &self,
        policy: &Self::Policy,
        env: &EnvironmentConfig,
        dataset: &Dataset,
    ) -> anyhow::Result<Trajectory>;

    /// Serialized artifact format, used by the policy store and training job.
    fn encode_policy(&self, policy: &Self::Policy) -> anyhow::Result<Vec<u8>>;

    fn decode_policy(&self, bytes: &[u8]) -> anyhow::Result<Self::Policy>;
}

/// Trading environment handed to the trainer.
///
/// Built only through [`EnvironmentConfig::for_dataset`], which keeps every
/// per-stock vector at `stock_dim` entries and
/// `state_space == 1 + 2·stock_dim + |indicators|·stock_dim`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    hmax: NonZeroU32,
    initial_amount: f64,
    buy_cost_pct: Vec<f64>,
    sell_cost_pct: Vec<f64>,
    state_space: usize,
    stock_dim: usize,
    indicator_names: Vec<String>,
    action_space: usize,
    reward_scaling: f64,
    num_stock_shares: Vec<u64>,
}

/// Cash, then price and holding per stock, then every indicator per stock.
pub fn state_space(stock_dim: usize, indicator_count: usize) -> usize {
    1 + 2 * stock_dim + indicator_count * stock_dim
}

impl EnvironmentConfig {
    /// One stock per distinct ticker in `dataset`, starting with no shares.
    pub fn for_dataset(
        settings: &EnvironmentSettings,
        dataset: &Dataset,
    ) -> Result<Self, PipelineError> {
        let hmax = NonZeroU32::new(settings.hmax)
            .ok_or_else(|| anyhow!("environment hmax must be positive"))?;
        let stock_dim = dataset.tickers().len();
        if stock_dim == 0 {
            return Err(anyhow!("cannot build a trading environment from an empty dataset").into());
        }
        let indicator_names = dataset.indicator_names().to_vec();

        Ok(Self {
            hmax,
            initial_amount: settings.initial_amount,
            buy_cost_pct: vec![settings.transaction_cost_pct; stock_dim],
            sell_cost_pct: vec![settings.transaction_cost_pct; stock_dim],
            state_space: state_space(stock_dim, indicator_names.len()),
            stock_dim,
            indicator_names,
            action_space: stock_dim,
            reward_scaling: settings.reward_scaling,
            num_stock_shares: vec![0; stock_dim],
        })
    }

    pub fn hmax(&self) -> NonZeroU32 {
        self.hmax
    }

    pub fn initial_amount(&self) -> f64 {
        self.initial_amount
    }

    pub fn buy_cost_pct(&self) -> &[f64] {
        &self.buy_cost_pct
    }

    pub fn sell_cost_pct(&self) -> &[f64] {
        &self.sell_cost_pct
    }

    pub fn state_space(&self) -> usize {
        self.state_space
    }

    pub fn stock_dim(&self) -> usize {
        self.stock_dim
    }

    pub fn indicator_names(&self) -> &[String] {
        &self.indicator_names
    }

    pub fn action_space(&self) -> usize {
        self.action_space
    }

    pub fn reward_scaling(&self) -> f64 {
        self.reward_scaling
    }

    pub fn num_stock_shares(&self) -> &[u64] {
        &self.num_stock_shares
    }
}

/// Result of one fit-and-replay cycle.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub env: EnvironmentConfig,
    pub trajectory: Trajectory,
}

pub struct TrainingOrchestrator<T: Trainer> {
    trainer: Arc<T>,
    settings: EnvironmentSettings,
    timesteps: u64,
}

impl<T: Trainer> Clone for TrainingOrchestrator<T> {
    fn clone(&self) -> Self {
        Self {
            trainer: Arc::clone(&self.trainer),
            settings: self.settings.clone(),
            timesteps: self.timesteps,
        }
    }
}

impl<T: Trainer> TrainingOrchestrator<T> {
    pub fn new(trainer: Arc<T>, settings: EnvironmentSettings, timesteps: u64) -> Self {
        Self {
            trainer,
            settings,
            timesteps,
        }
    }

    pub fn trainer(&self) -> &Arc<T> {
        &self.trainer
    }

    pub fn timesteps(&self) -> u64 {
        self.timesteps
    }

    pub fn environment_for(&self, dataset: &Dataset) -> Result<EnvironmentConfig, PipelineError> {
        EnvironmentConfig::for_dataset(&self.settings, dataset)
    }

    /// Fit on the training partition, then replay over the test partition.
    ///
    /// The environment is sized from the training partition.
    pub fn train_and_simulate(&self, split: &SplitDataset) -> Result<TrainingOutcome, PipelineError> {
        let env = self.environment_for(&split.train)?;
        let policy = self.fit(&env, &split.train)?;
        let trajectory = self.simulate(&policy, &env, &split.test)?;
        Ok(TrainingOutcome { env, trajectory })
    }

    pub fn fit(&self, env: &EnvironmentConfig, train: &Dataset) -> Result<T::Policy, PipelineError> {
        Ok(self.trainer.fit(env, train, self.timesteps)?)
    }

    /// Replay and reject trajectories no downstream step can use.
    pub fn simulate(
        &self,
        policy: &T::Policy,
        env: &EnvironmentConfig,
        dataset: &Dataset,
    ) -> Result<Trajectory, PipelineError> {
        let trajectory = self.trainer.simulate(policy, env, dataset)?;
        if trajectory.accounts.is_empty() {
            return Err(anyhow!("trainer returned an empty equity curve").into());
        }
        if !trajectory.is_date_ordered() {
            return Err(anyhow!("trainer returned an equity curve out of date order").into());
        }
        Ok(trajectory)
    }
}
