//! ONNX-backed model adapter.
//!
//! Wraps one ONNX Runtime session per model family. Probability extraction
//! handles both plain tensor outputs and the seq(map) output format some
//! training toolchains export for classifiers. An optional sidecar of
//! fraud-indicative terms (exported at training time from the model's
//! learned coefficients) drives feature ranking and model-level reasons.

use crate::error::DetectorError;
use crate::features::PostingFeatures;
use crate::models::adapter::{FeatureKind, FraudModel, MAX_SINGLE_MODEL_REASONS};
use crate::types::JobPosting;
use ort::memory::Allocator;
use ort::session::Session;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// One loaded ONNX classifier.
pub struct OnnxModel {
    name: String,
    kind: FeatureKind,
    /// `Session::run` takes `&mut self`; the mutex keeps `score` callable
    /// through a shared reference from parallel predictions.
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    /// Where the .onnx artifact was loaded from; used by `export`.
    source_path: PathBuf,
    terms_path: Option<PathBuf>,
    /// Fraud-indicative terms with importances, ranked descending.
    term_weights: Vec<(String, f64)>,
}

impl OnnxModel {
    pub(crate) fn new(
        name: String,
        kind: FeatureKind,
        session: Session,
        input_name: String,
        output_name: String,
        source_path: PathBuf,
        terms_path: Option<PathBuf>,
        term_weights: Vec<(String, f64)>,
    ) -> Self {
        Self {
            name,
            kind,
            session: Mutex::new(session),
            input_name,
            output_name,
            source_path,
            terms_path,
            term_weights,
        }
    }

    /// Extract the fraud-class probability from the session outputs.
    ///
    /// Tries the named output first, then falls back to iterating all
    /// outputs, skipping any "label" output. Failure to extract is an error,
    /// never a default score.
    fn extract_probability(
        &self,
        outputs: &ort::session::SessionOutputs,
    ) -> Result<f64, DetectorError> {
        if let Some(output) = outputs.get(&self.output_name) {
            let dtype = output.dtype();

            if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
                let prob = extract_fraud_prob_from_tensor(&shape, data);
                debug!(model = %self.name, prob = prob, "Extracted from tensor");
                return Ok(prob);
            }

            if DynSequenceValueType::can_downcast(&dtype) {
                if let Ok(prob) = self.extract_from_sequence_map(output) {
                    return Ok(prob);
                }
            }
        }

        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }

            let dtype = output.dtype();

            if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
                let prob = extract_fraud_prob_from_tensor(&shape, data);
                debug!(model = %self.name, output = %name, prob = prob, "Extracted from tensor (fallback)");
                return Ok(prob);
            }

            if DynSequenceValueType::can_downcast(&dtype) {
                if let Ok(prob) = self.extract_from_sequence_map(&output) {
                    return Ok(prob);
                }
            }
        }

        Err(DetectorError::unavailable(
            &self.name,
            "no probability output could be extracted",
        ))
    }

    /// Extract probability from the seq(map(int64, float)) output format.
    fn extract_from_sequence_map(
        &self,
        output: &ort::value::DynValue,
    ) -> Result<f64, DetectorError> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| DetectorError::Onnx(format!("failed to downcast to sequence: {e}")))?;

        let maps = sequence
            .try_extract_sequence::<DynMapValueType>(&allocator)
            .map_err(|e| DetectorError::Onnx(e.to_string()))?;

        let map_value = maps
            .first()
            .ok_or_else(|| DetectorError::Onnx("empty sequence output".to_string()))?;

        let kv_pairs = map_value
            .try_extract_key_values::<i64, f32>()
            .map_err(|e| DetectorError::Onnx(e.to_string()))?;

        // Class 1 is the fraudulent class.
        for (class_id, prob) in &kv_pairs {
            if *class_id == 1 {
                debug!(model = %self.name, prob = *prob, "Extracted from seq(map)");
                return Ok(*prob as f64);
            }
        }
        for (class_id, prob) in &kv_pairs {
            if *class_id == 0 {
                return Ok(1.0 - *prob as f64);
            }
        }

        Err(DetectorError::Onnx(
            "no class probability found in map output".to_string(),
        ))
    }
}

/// Extract the fraud-class probability from tensor data.
fn extract_fraud_prob_from_tensor(shape: &ort::tensor::Shape, data: &[f32]) -> f64 {
    let dims: Vec<i64> = shape.iter().copied().collect();

    if dims.len() == 2 {
        let num_classes = dims[1] as usize;
        if num_classes >= 2 {
            // [batch, num_classes] - fraud class is index 1
            return data[1] as f64;
        } else if num_classes == 1 {
            return data[0] as f64;
        }
    } else if dims.len() == 1 {
        let num_classes = dims[0] as usize;
        if num_classes >= 2 {
            return data[1] as f64;
        } else if num_classes == 1 {
            return data[0] as f64;
        }
    }

    data.last().map(|&v| v as f64).unwrap_or(0.5)
}

impl FraudModel for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_kind(&self) -> FeatureKind {
        self.kind
    }

    fn score(&self, features: &PostingFeatures) -> Result<f64, DetectorError> {
        use ort::value::Tensor;

        let input = features.for_kind(self.kind);
        let shape = vec![1_i64, input.len() as i64];
        let input_tensor = Tensor::from_array((shape, input.to_vec()))
            .map_err(|e| DetectorError::Onnx(format!("failed to create input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| DetectorError::unavailable(&self.name, format!("lock error: {e}")))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_tensor])
            .map_err(|e| DetectorError::unavailable(&self.name, e))?;

        Ok(self.extract_probability(&outputs)?.clamp(0.0, 1.0))
    }

    fn rank_features(&self, top_n: usize) -> Vec<(String, f64)> {
        self.term_weights.iter().take(top_n).cloned().collect()
    }

    /// Reasons from the model's own learned-term signal: which of its
    /// fraud-indicative terms actually appear in this posting.
    fn explain(&self, posting: &JobPosting) -> Result<Vec<String>, DetectorError> {
        if self.term_weights.is_empty() {
            return Ok(Vec::new());
        }

        let text = posting.combined_text();
        let reasons: Vec<String> = self
            .term_weights
            .iter()
            .filter(|(term, weight)| *weight > 0.0 && text.contains(term.as_str()))
            .map(|(term, _)| format!("Contains suspicious keyword: '{term}'"))
            .take(MAX_SINGLE_MODEL_REASONS)
            .collect();

        Ok(reasons)
    }

    fn export(&self, dir: &Path) -> Result<(), DetectorError> {
        let file_name = self.source_path.file_name().ok_or_else(|| {
            DetectorError::Artifact(format!(
                "model '{}' has no source file name",
                self.name
            ))
        })?;
        std::fs::copy(&self.source_path, dir.join(file_name))?;

        if let Some(terms_path) = &self.terms_path {
            if let Some(terms_name) = terms_path.file_name() {
                std::fs::copy(terms_path, dir.join(terms_name))?;
            }
        }
        Ok(())
    }
}
