//! Process-lifetime holder of the persisted policy artifact.
//!
//! The artifact is read and decoded on first use and kept in memory after
//! that. A missing file fails the request with `ModelMissing`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use tracing::info;

use crate::error::PipelineError;
use crate::trainer::Trainer;

pub struct PolicyStore<T: Trainer> {
    path: PathBuf,
    trainer: Arc<T>,
    loaded: Mutex<Option<Arc<T::Policy>>>,
}

impl<T: Trainer> PolicyStore<T> {
    pub fn new(path: impl Into<PathBuf>, trainer: Arc<T>) -> Self {
        Self {
            path: path.into(),
            trainer,
            loaded: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The cached policy, loading it from disk on first call.
    pub fn load(&self) -> Result<Arc<T::Policy>, PipelineError> {
        if !self.path.exists() {
            return Err(self.missing());
        }

        let mut slot = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(policy) = slot.as_ref() {
            return Ok(Arc::clone(policy));
        }

        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(self.missing()),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read policy artifact {}", self.path.display()))
                    .into())
            }
        };
        let policy = self
            .trainer
            .decode_policy(&bytes)
            .with_context(|| format!("decode policy artifact {}", self.path.display()))?;
        let policy = Arc::new(policy);

        info!(
            path = %self.path.display(),
            bytes = bytes.len(),
            fingerprint = %blake3::hash(&bytes).to_hex(),
            "policy artifact loaded"
        );
        *slot = Some(Arc::clone(&policy));
        Ok(policy)
    }

    fn missing(&self) -> PipelineError {
        PipelineError::ModelMissing {
            path: self.path.clone(),
        }
    }
}
