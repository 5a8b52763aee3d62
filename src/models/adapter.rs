//! Uniform capability contract for the underlying classifiers.
//!
//! The aggregator, explainer, and facade depend only on this trait, never on
//! a concrete model family.

use crate::error::DetectorError;
use crate::features::PostingFeatures;
use crate::types::JobPosting;
use std::path::Path;

/// Which extracted feature family a model consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// tf-idf over combined free text
    Text,
    /// one-hot over structured categorical fields
    Categorical,
}

impl PostingFeatures {
    /// The vector a model of the given kind scores.
    pub fn for_kind(&self, kind: FeatureKind) -> &[f32] {
        match kind {
            FeatureKind::Text => &self.text,
            FeatureKind::Categorical => &self.categorical,
        }
    }
}

/// Maximum reasons a single model's explainer may contribute.
pub const MAX_SINGLE_MODEL_REASONS: usize = 5;

/// One trained binary classifier behind a uniform interface.
///
/// Implementations are read-only after load; `score` is a pure function of
/// its input features. A model that is not loaded must fail fast with
/// [`DetectorError::ModelUnavailable`] rather than return a default score;
/// callers exclude an unavailable model from aggregation, they never treat
/// it as a zero vote.
pub trait FraudModel: Send + Sync {
    /// Stable model identifier (weights key, artifact name, report key).
    fn name(&self) -> &str;

    /// Feature family this model was trained on.
    fn feature_kind(&self) -> FeatureKind;

    /// Fraud probability in [0, 1] for the extracted features.
    fn score(&self, features: &PostingFeatures) -> Result<f64, DetectorError>;

    /// Ranked (feature label, importance) pairs, most influential first.
    ///
    /// Empty when the model carries no importance signal.
    fn rank_features(&self, _top_n: usize) -> Vec<(String, f64)> {
        Vec::new()
    }

    /// Reasons driven by the model's own signal for this posting.
    ///
    /// Best-effort; capped at [`MAX_SINGLE_MODEL_REASONS`]. Models without
    /// an explanation signal return an empty list.
    fn explain(&self, _posting: &JobPosting) -> Result<Vec<String>, DetectorError> {
        Ok(Vec::new())
    }

    /// Write this model's artifact(s) into a snapshot directory.
    fn export(&self, dir: &Path) -> Result<(), DetectorError>;
}

/// One model's output for one posting. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct ModelVerdict {
    /// Fraud probability in [0, 1]
    pub probability: f64,
    /// Ranked influential features, when the model exposes them
    pub top_features: Vec<(String, f64)>,
    /// Model-supplied reasons, when the model exposes them
    pub reasons: Vec<String>,
}

impl ModelVerdict {
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            top_features: Vec::new(),
            reasons: Vec::new(),
        }
    }
}
