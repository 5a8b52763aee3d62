//! ONNX model loader

use crate::error::DetectorError;
use crate::models::adapter::FeatureKind;
use crate::models::onnx::OnnxModel;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

/// The model families an ensemble snapshot may contain, with their artifact
/// names and the feature family each was trained on.
pub const MODEL_ARTIFACTS: [(&str, &str, FeatureKind); 4] = [
    (
        "logistic_regression",
        "logistic_regression.onnx",
        FeatureKind::Text,
    ),
    ("mlp", "mlp.onnx", FeatureKind::Text),
    ("random_forest", "random_forest.onnx", FeatureKind::Categorical),
    ("svm", "svm.onnx", FeatureKind::Text),
];

/// Sidecar file name for a model's exported fraud-indicative terms.
pub fn terms_artifact_name(model_name: &str) -> String {
    format!("{model_name}_terms.json")
}

/// Loader for ONNX model artifacts.
pub struct ModelLoader {
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a loader with default settings (1 inference thread).
    pub fn new() -> Result<Self, DetectorError> {
        Self::with_threads(1)
    }

    /// Create a loader with the given per-session thread count.
    pub fn with_threads(onnx_threads: usize) -> Result<Self, DetectorError> {
        ort::init()
            .commit()
            .map_err(|e| DetectorError::Onnx(e.to_string()))?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load a single model from an artifact file.
    pub fn load_model<P: AsRef<Path>>(
        &self,
        path: P,
        name: &str,
        kind: FeatureKind,
    ) -> Result<OnnxModel, DetectorError> {
        let path = path.as_ref();

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(self.onnx_threads))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| {
                DetectorError::Artifact(format!(
                    "failed to load model from {}: {e}",
                    path.display()
                ))
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob") || o.name.contains("output"))
            .map(|o| o.name.clone())
            .unwrap_or_else(|| {
                session
                    .outputs
                    .last()
                    .map(|o| o.name.clone())
                    .unwrap_or_else(|| "probabilities".to_string())
            });

        // Term sidecar is optional; a model without one simply contributes
        // no keyword-level reasons.
        let terms_path = path
            .parent()
            .map(|dir| dir.join(terms_artifact_name(name)))
            .filter(|p| p.exists());
        let term_weights = match &terms_path {
            Some(p) => load_term_weights(p)?,
            None => Vec::new(),
        };

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            terms = term_weights.len(),
            "Model loaded successfully"
        );

        Ok(OnnxModel::new(
            name.to_string(),
            kind,
            session,
            input_name,
            output_name,
            path.to_path_buf(),
            terms_path,
            term_weights,
        ))
    }

    /// Load every model artifact present in a directory.
    ///
    /// Missing or unloadable artifacts are skipped with a warning; zero
    /// loadable models is a hard error.
    pub fn load_all_models<P: AsRef<Path>>(
        &self,
        models_dir: P,
    ) -> Result<Vec<OnnxModel>, DetectorError> {
        let models_dir = models_dir.as_ref();
        let mut models = Vec::new();

        for (name, filename, kind) in MODEL_ARTIFACTS {
            let path = models_dir.join(filename);
            if path.exists() {
                match self.load_model(&path, name, kind) {
                    Ok(model) => models.push(model),
                    Err(e) => {
                        warn!(model = %name, error = %e, "Failed to load model, skipping");
                    }
                }
            } else {
                warn!(model = %name, path = %path.display(), "Model artifact not found, skipping");
            }
        }

        if models.is_empty() {
            return Err(DetectorError::NoScorableModel);
        }

        info!(
            count = models.len(),
            dir = %models_dir.display(),
            "Loaded ensemble models"
        );

        Ok(models)
    }
}

/// Read a ranked term-weight sidecar.
fn load_term_weights(path: &Path) -> Result<Vec<(String, f64)>, DetectorError> {
    let file = File::open(path)?;
    let mut terms: Vec<(String, f64)> = serde_json::from_reader(BufReader::new(file))?;
    terms.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(terms)
}
