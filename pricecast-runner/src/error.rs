//! Error taxonomy at the service boundary.
//!
//! Every component fails fast and hands its first error up unchanged. The
//! request layer maps an [`ErrorClass`] to a caller-visible response.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use pricecast_core::data::DataError;
use pricecast_core::features::DatasetError;

/// How the request layer should present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller can fix the request.
    Client,
    /// The history provider failed; try again later.
    Upstream,
    /// Needs an operator (missing policy artifact).
    Operator,
    /// Anything unanticipated.
    Internal,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid range: end {end} is not after start {start}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("symbol must not be empty")]
    InvalidSymbol,

    #[error("no price history returned for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient historical data for {symbol}: {detail}")]
    InsufficientData { symbol: String, detail: String },

    #[error("rate limited by the history provider")]
    RateLimited,

    #[error("history provider unreachable: {0}")]
    Unreachable(String),

    #[error("history provider error: {0}")]
    ProviderError(String),

    #[error("policy artifact not found at {}", path.display())]
    ModelMissing { path: PathBuf },

    #[error(transparent)]
    PipelineFailure(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PipelineError::InvalidRange { .. }
            | PipelineError::InvalidSymbol
            | PipelineError::NoData { .. }
            | PipelineError::InsufficientData { .. } => ErrorClass::Client,
            PipelineError::RateLimited
            | PipelineError::Unreachable(_)
            | PipelineError::ProviderError(_) => ErrorClass::Upstream,
            PipelineError::ModelMissing { .. } => ErrorClass::Operator,
            PipelineError::PipelineFailure(_) => ErrorClass::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Upstream
    }
}

impl From<DataError> for PipelineError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::InvalidSymbol => PipelineError::InvalidSymbol,
            DataError::InvalidRange { start, end } => PipelineError::InvalidRange { start, end },
            DataError::RateLimited => PipelineError::RateLimited,
            DataError::Unreachable(msg) => PipelineError::Unreachable(msg),
            DataError::ProviderError(msg) => PipelineError::ProviderError(msg),
        }
    }
}

impl From<DatasetError> for PipelineError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::InsufficientData { symbol, detail } => {
                PipelineError::InsufficientData { symbol, detail }
            }
            DatasetError::Indicators(source) => PipelineError::PipelineFailure(source),
        }
    }
}
