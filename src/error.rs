//! Error types for the classification and decluttering engine.
//!
//! The extractor never fails: unparsable or partial matches are skipped, so
//! there is intentionally no extraction variant here.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used across the library.
pub type Result<T, E = SieveError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SieveError {
    /// Parallel sequences (texts / labels / hints / features) disagree in length.
    #[error("input shape mismatch: {texts} texts but {labels} labels")]
    InputShape { texts: usize, labels: usize },

    /// Empty training set, or fewer than two distinct classes.
    #[error("training data error: {0}")]
    TrainingData(String),

    /// `predict` or `save` was called with no resolvable model.
    #[error("no trained model is loaded")]
    ModelNotLoaded,

    /// A model artifact is missing, corrupt, or was produced by an
    /// incompatible pipeline version.
    #[error("failed to load model from {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    /// Writing a model artifact failed. Nothing is left half-written.
    #[error("failed to store model at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A boundary label token that the configured encoding does not know.
    #[error("unknown label token {0:?}")]
    InvalidLabel(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl SieveError {
    pub fn model_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ModelLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    pub fn training(msg: impl Into<String>) -> Self {
        Self::TrainingData(msg.into())
    }
}
