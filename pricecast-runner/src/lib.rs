//! PriceCast Runner: training orchestration, backtest metrics, caching, and
//! the `resolve` boundary.
//!
//! This crate builds on `pricecast-core` to provide:
//! - Service configuration (TOML plus `PRICECAST_*` overrides)
//! - The error taxonomy the request layer translates into responses
//! - The trainer boundary and trading environment construction
//! - Backtest metrics and result payloads
//! - The full per-symbol pipeline behind a TTL cache
//! - A persisted-policy store, live prediction, and the training job
//! - A worker pool that keeps pipeline runs off dispatch threads

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod live;
pub mod metrics;
pub mod payload;
pub mod pipeline;
pub mod policy_store;
pub mod service;
pub mod trainer;
pub mod training;

pub use cache::{CacheEntry, PredictionCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, ServiceConfig};
pub use error::{ErrorClass, PipelineError};
pub use live::LivePredictor;
pub use metrics::BacktestMetrics;
pub use payload::{
    BacktestPayload, EquityPoint, LivePrediction, PredictionPayload, PredictionPoint, PricePoint,
    DISCLAIMER,
};
pub use pipeline::{normalize_symbol, PredictionPipeline, Resolution};
pub use policy_store::PolicyStore;
pub use service::{PredictionService, ResolveResponse, ResolverPool};
pub use trainer::{EnvironmentConfig, Trainer, TrainingOrchestrator, TrainingOutcome};
pub use training::{PolicyTrainingJob, TrainingReport};
