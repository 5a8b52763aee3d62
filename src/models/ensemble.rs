//! Ensemble facade: the single entry point for the serving layer.
//!
//! Owns the configured models, their weight snapshot, the feature
//! extraction collaborator, and the explanation engine, and orchestrates
//! one prediction in fixed order: extract, score, aggregate, explain.

use crate::error::DetectorError;
use crate::explain::{ExplanationConfig, ExplanationEngine};
use crate::features::FeatureExtractor;
use crate::models::adapter::{FraudModel, ModelVerdict};
use crate::models::consensus::{ConsensusAggregator, ConsensusResult, ModelWeights};
use crate::models::loader::ModelLoader;
use crate::types::{FraudReport, JobPosting};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, info, warn};

/// File name of the weights artifact within a snapshot directory.
pub const WEIGHTS_ARTIFACT: &str = "ensemble_weights.json";

/// Result of one ensemble prediction.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub consensus: ConsensusResult,
    /// Per-model verdicts in model registration order
    pub verdicts: Vec<(String, ModelVerdict)>,
    /// Ranked, deduplicated reasons
    pub reasons: Vec<String>,
}

impl Prediction {
    /// Highest-importance features among the models that expose them, in
    /// model registration order.
    pub fn top_fraud_indicators(&self) -> &[(String, f64)] {
        self.verdicts
            .iter()
            .map(|(_, v)| v.top_features.as_slice())
            .find(|f| !f.is_empty())
            .unwrap_or(&[])
    }

    /// Build the report exposed to the serving layer.
    pub fn to_report(&self, posting: &JobPosting) -> FraudReport {
        let model_probabilities: HashMap<String, f64> = self
            .verdicts
            .iter()
            .map(|(name, v)| (name.clone(), v.probability))
            .collect();

        FraudReport::new(
            posting,
            self.consensus.is_fraudulent,
            self.consensus.fraud_probability * 100.0,
            self.consensus.risk_tier,
            self.reasons.clone(),
            model_probabilities,
        )
    }
}

/// Multi-model fraud detector.
pub struct EnsembleDetector {
    /// Registration order fixes verdict iteration and first-seen reason order
    models: Vec<Box<dyn FraudModel>>,
    weights: ModelWeights,
    extractor: FeatureExtractor,
    engine: ExplanationEngine,
}

impl EnsembleDetector {
    /// Assemble a detector from already-constructed parts.
    pub fn new(
        models: Vec<Box<dyn FraudModel>>,
        extractor: FeatureExtractor,
        explanation: ExplanationConfig,
    ) -> Result<Self, DetectorError> {
        if models.is_empty() {
            return Err(DetectorError::NoScorableModel);
        }
        let weights = ModelWeights::equal(models.iter().map(|m| m.name().to_string()));
        Ok(Self {
            models,
            weights,
            extractor,
            engine: ExplanationEngine::new(explanation),
        })
    }

    /// Load a detector from a snapshot directory.
    ///
    /// Missing model artifacts are skipped with a warning (zero models is
    /// fatal). A missing weights artifact falls back to equal weighting; a
    /// missing extractor artifact leaves extraction unfitted, which fails
    /// individual predictions rather than the load.
    pub fn load<P: AsRef<Path>>(
        models_dir: P,
        onnx_threads: usize,
        explanation: ExplanationConfig,
    ) -> Result<Self, DetectorError> {
        let models_dir = models_dir.as_ref();

        let loader = ModelLoader::with_threads(onnx_threads)?;
        let models: Vec<Box<dyn FraudModel>> = loader
            .load_all_models(models_dir)?
            .into_iter()
            .map(|m| Box::new(m) as Box<dyn FraudModel>)
            .collect();

        let names: Vec<String> = models.iter().map(|m| m.name().to_string()).collect();
        let weights = load_weights(models_dir, &names)?;

        let extractor = if models_dir.join(crate::features::PREPROCESSOR_ARTIFACT).exists() {
            FeatureExtractor::load_from_dir(models_dir)?
        } else {
            warn!(
                dir = %models_dir.display(),
                "Feature extractor artifact not found, predictions will fail until one is loaded"
            );
            FeatureExtractor::default()
        };

        info!(
            models = ?names,
            "Ensemble detector loaded"
        );

        Ok(Self {
            models,
            weights,
            extractor,
            engine: ExplanationEngine::new(explanation),
        })
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name()).collect()
    }

    pub fn weights(&self) -> &ModelWeights {
        &self.weights
    }

    /// Replace the weight snapshot.
    ///
    /// Overrides are merged into the current weights and renormalized to
    /// sum 1. Not safe to interleave with in-flight predictions; the caller
    /// serializes reconfiguration.
    pub fn set_weights(&mut self, overrides: HashMap<String, f64>) -> Result<(), DetectorError> {
        self.weights.assign(overrides)?;
        info!(weights = ?self.weights.as_map(), "Model weights updated");
        Ok(())
    }

    /// Score a posting through the full pipeline.
    ///
    /// Fails only if feature extraction fails or no model produces a score;
    /// an individual model failure drops that model from aggregation with a
    /// warning.
    pub fn predict(&self, posting: &JobPosting) -> Result<Prediction, DetectorError> {
        let features = self.extractor.extract(posting)?;

        let mut verdicts: Vec<(String, ModelVerdict)> = Vec::with_capacity(self.models.len());
        for model in &self.models {
            match model.score(&features) {
                Ok(probability) => {
                    let mut verdict = ModelVerdict::new(probability);
                    verdict.top_features = model.rank_features(5);
                    match model.explain(posting) {
                        Ok(reasons) => verdict.reasons = reasons,
                        Err(e) => {
                            warn!(model = %model.name(), error = %e, "Model explanation failed, omitting");
                        }
                    }
                    verdicts.push((model.name().to_string(), verdict));
                }
                Err(e) => {
                    warn!(model = %model.name(), error = %e, "Model failed to score, dropping from consensus");
                }
            }
        }

        let consensus = ConsensusAggregator::aggregate(&verdicts, Some(&self.weights))?;
        let reasons = self.engine.explain(posting, &consensus, &verdicts);

        debug!(
            posting_id = %posting.posting_id,
            fraud_probability = consensus.fraud_probability,
            agreement = consensus.agreement_percent,
            models = verdicts.len(),
            "Prediction complete"
        );

        Ok(Prediction {
            consensus,
            verdicts,
            reasons,
        })
    }

    /// Write the complete ensemble state into one directory: one artifact
    /// per model plus the weights and extractor artifacts.
    pub fn save_snapshot<P: AsRef<Path>>(&self, dir: P) -> Result<(), DetectorError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        for model in &self.models {
            model.export(dir)?;
        }

        let file = File::create(dir.join(WEIGHTS_ARTIFACT))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self.weights.as_map())?;

        if self.extractor.is_fitted() {
            self.extractor.save_to_dir(dir)?;
        }

        info!(dir = %dir.display(), models = self.models.len(), "Ensemble snapshot saved");
        Ok(())
    }
}

/// Read the weights artifact, defaulting to equal weights when absent.
fn load_weights(dir: &Path, model_names: &[String]) -> Result<ModelWeights, DetectorError> {
    let path = dir.join(WEIGHTS_ARTIFACT);
    if !path.exists() {
        return Ok(ModelWeights::equal(model_names.iter().cloned()));
    }
    let file = File::open(&path)?;
    let map: HashMap<String, f64> = serde_json::from_reader(BufReader::new(file))?;
    ModelWeights::from_map(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::NO_WARNING_REASON;
    use crate::features::PostingFeatures;
    use crate::models::adapter::FeatureKind;
    use crate::types::RiskTier;

    /// Fixed-probability model for facade tests.
    struct FixedModel {
        name: &'static str,
        probability: f64,
        available: bool,
        reasons: Vec<String>,
        top_features: Vec<(String, f64)>,
    }

    impl FixedModel {
        fn new(name: &'static str, probability: f64) -> Self {
            Self {
                name,
                probability,
                available: true,
                reasons: Vec::new(),
                top_features: Vec::new(),
            }
        }

        fn unavailable(name: &'static str) -> Self {
            Self {
                available: false,
                ..Self::new(name, 0.0)
            }
        }
    }

    impl FraudModel for FixedModel {
        fn name(&self) -> &str {
            self.name
        }

        fn feature_kind(&self) -> FeatureKind {
            FeatureKind::Text
        }

        fn score(&self, _features: &PostingFeatures) -> Result<f64, DetectorError> {
            if self.available {
                Ok(self.probability)
            } else {
                Err(DetectorError::unavailable(self.name, "not loaded"))
            }
        }

        fn rank_features(&self, top_n: usize) -> Vec<(String, f64)> {
            self.top_features.iter().take(top_n).cloned().collect()
        }

        fn explain(&self, _posting: &JobPosting) -> Result<Vec<String>, DetectorError> {
            Ok(self.reasons.clone())
        }

        fn export(&self, dir: &Path) -> Result<(), DetectorError> {
            std::fs::write(dir.join(format!("{}.onnx", self.name)), b"stub")?;
            Ok(())
        }
    }

    fn fitted_extractor() -> FeatureExtractor {
        let mut a = JobPosting::new("a", "Software engineer");
        a.description = "Build backend services for our platform".to_string();
        a.employment_type = "Full-time".to_string();
        let mut b = JobPosting::new("b", "Backend engineer");
        b.description = "Operate backend services for our product".to_string();
        b.employment_type = "Part-time".to_string();
        FeatureExtractor::fit(&[a, b])
    }

    fn detector(models: Vec<Box<dyn FraudModel>>) -> EnsembleDetector {
        EnsembleDetector::new(models, fitted_extractor(), ExplanationConfig::default()).unwrap()
    }

    fn reference_models() -> Vec<Box<dyn FraudModel>> {
        vec![
            Box::new(FixedModel::new("logistic_regression", 0.9)),
            Box::new(FixedModel::new("mlp", 0.85)),
            Box::new(FixedModel::new("random_forest", 0.95)),
            Box::new(FixedModel::new("svm", 0.88)),
        ]
    }

    #[test]
    fn test_predict_reference_ensemble() {
        let detector = detector(reference_models());
        let posting = JobPosting::new("p1", "Data entry clerk");

        let prediction = detector.predict(&posting).unwrap();
        assert!((prediction.consensus.fraud_probability - 0.895).abs() < 1e-9);
        assert_eq!(prediction.consensus.agreement_percent, 100.0);
        assert_eq!(prediction.consensus.risk_tier, RiskTier::High);
        assert_eq!(prediction.verdicts.len(), 4);

        let report = prediction.to_report(&posting);
        assert!(report.is_fraudulent);
        assert!((report.confidence_score - 89.5).abs() < 1e-9);
        assert_eq!(report.posting_id, "p1");
        assert_eq!(report.model_probabilities.len(), 4);
        assert!(!report.reasons.is_empty());
    }

    #[test]
    fn test_unavailable_model_degrades_not_aborts() {
        let models: Vec<Box<dyn FraudModel>> = vec![
            Box::new(FixedModel::new("logistic_regression", 0.8)),
            Box::new(FixedModel::unavailable("mlp")),
            Box::new(FixedModel::new("svm", 0.6)),
        ];
        let detector = detector(models);

        let prediction = detector.predict(&JobPosting::new("p", "Clerk")).unwrap();
        assert_eq!(prediction.verdicts.len(), 2);
        // Equal weights renormalized over the two survivors.
        assert!((prediction.consensus.fraud_probability - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_all_models_unavailable_is_hard_error() {
        let models: Vec<Box<dyn FraudModel>> = vec![
            Box::new(FixedModel::unavailable("mlp")),
            Box::new(FixedModel::unavailable("svm")),
        ];
        let detector = detector(models);

        assert!(matches!(
            detector.predict(&JobPosting::new("p", "Clerk")),
            Err(DetectorError::NoScorableModel)
        ));
    }

    #[test]
    fn test_zero_configured_models_rejected() {
        let result =
            EnsembleDetector::new(Vec::new(), fitted_extractor(), ExplanationConfig::default());
        assert!(matches!(result, Err(DetectorError::NoScorableModel)));
    }

    #[test]
    fn test_unfitted_extractor_fails_prediction() {
        let detector = EnsembleDetector::new(
            reference_models(),
            FeatureExtractor::default(),
            ExplanationConfig::default(),
        )
        .unwrap();

        assert!(matches!(
            detector.predict(&JobPosting::new("p", "Clerk")),
            Err(DetectorError::EncoderNotFitted)
        ));
    }

    #[test]
    fn test_legitimate_consensus_yields_no_warning_report() {
        let models: Vec<Box<dyn FraudModel>> = vec![
            Box::new(FixedModel::new("mlp", 0.2)),
            Box::new(FixedModel::new("svm", 0.4)),
        ];
        let detector = detector(models);

        let prediction = detector.predict(&JobPosting::new("p", "Clerk")).unwrap();
        assert!(!prediction.consensus.is_fraudulent);
        assert_eq!(prediction.reasons, vec![NO_WARNING_REASON.to_string()]);
    }

    #[test]
    fn test_top_fraud_indicators_from_first_model_exposing_them() {
        let mut ranked = FixedModel::new("random_forest", 0.9);
        ranked.top_features = vec![("wire transfer".to_string(), 0.31)];
        let models: Vec<Box<dyn FraudModel>> = vec![
            Box::new(FixedModel::new("mlp", 0.8)),
            Box::new(ranked),
        ];
        let detector = detector(models);

        let prediction = detector.predict(&JobPosting::new("p", "Clerk")).unwrap();
        assert_eq!(
            prediction.top_fraud_indicators(),
            &[("wire transfer".to_string(), 0.31)]
        );
    }

    #[test]
    fn test_set_weights_validates_and_normalizes() {
        let mut detector = detector(reference_models());

        let err = detector.set_weights(HashMap::from([("mlp".to_string(), -1.0)]));
        assert!(matches!(err, Err(DetectorError::InvalidWeights(_))));

        detector
            .set_weights(HashMap::from([("mlp".to_string(), 1.0)]))
            .unwrap();
        let total: f64 = detector.weights().as_map().values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_writes_all_artifacts() {
        let detector = detector(reference_models());
        let dir = tempfile::tempdir().unwrap();

        detector.save_snapshot(dir.path()).unwrap();

        for name in ["logistic_regression", "mlp", "random_forest", "svm"] {
            assert!(dir.path().join(format!("{name}.onnx")).exists());
        }
        assert!(dir.path().join(WEIGHTS_ARTIFACT).exists());
        assert!(dir
            .path()
            .join(crate::features::PREPROCESSOR_ARTIFACT)
            .exists());

        let names: Vec<String> = detector.model_names().iter().map(|s| s.to_string()).collect();
        let weights = load_weights(dir.path(), &names).unwrap();
        let total: f64 = weights.as_map().values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_weights_artifact_defaults_to_equal() {
        let dir = tempfile::tempdir().unwrap();
        let names = vec!["mlp".to_string(), "svm".to_string()];
        let weights = load_weights(dir.path(), &names).unwrap();
        assert_eq!(weights.get("mlp"), Some(0.5));
        assert_eq!(weights.get("svm"), Some(0.5));
    }
}
