//! Error types for the fraud detection library.

use thiserror::Error;

/// Errors surfaced by the detection library.
///
/// Configuration errors (`NoScorableModel`, `InvalidWeights`) are fatal and
/// surfaced to the caller. `ModelUnavailable` degrades the ensemble: the
/// model is dropped from aggregation and prediction proceeds with the rest.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// No model produced a usable probability for this prediction.
    #[error("no scorable model available")]
    NoScorableModel,

    /// A model is not loaded or failed to produce a score.
    #[error("model '{name}' unavailable: {reason}")]
    ModelUnavailable { name: String, reason: String },

    /// Weight configuration is malformed (negative, non-finite, or all zero).
    #[error("invalid model weights: {0}")]
    InvalidWeights(String),

    /// The feature encoder was used before its fitted artifact was loaded.
    #[error("feature encoder has not been fitted")]
    EncoderNotFitted,

    /// A persistence artifact is missing or malformed.
    #[error("artifact error: {0}")]
    Artifact(String),

    /// ONNX runtime initialization or session failure.
    #[error("onnx runtime error: {0}")]
    Onnx(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl DetectorError {
    pub(crate) fn unavailable(name: &str, reason: impl std::fmt::Display) -> Self {
        Self::ModelUnavailable {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}
