//! Feature extraction for model inference.
//!
//! Transforms a posting into the per-family feature vectors the models were
//! trained against: a tf-idf vector over the combined free text, and a
//! one-hot vector over the structured categorical fields. Both encoders are
//! fitted offline; at serving time the fitted state is loaded from a single
//! JSON artifact.

pub mod encoder;
pub mod vectorizer;

pub use encoder::CategoricalEncoder;
pub use vectorizer::TextVectorizer;

use crate::error::DetectorError;
use crate::types::JobPosting;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

/// Extracted feature vectors for one posting.
#[derive(Debug, Clone)]
pub struct PostingFeatures {
    /// tf-idf over the combined free text
    pub text: Vec<f32>,
    /// one-hot over the structured categorical fields
    pub categorical: Vec<f32>,
}

/// Fitted feature extractor combining the text and categorical encoders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureExtractor {
    vectorizer: TextVectorizer,
    encoder: CategoricalEncoder,
}

/// File name of the extractor artifact within a model snapshot directory.
pub const PREPROCESSOR_ARTIFACT: &str = "preprocessor.json";

impl FeatureExtractor {
    /// Fit both encoders from a posting corpus.
    pub fn fit(corpus: &[JobPosting]) -> Self {
        let texts: Vec<String> = corpus.iter().map(|p| p.combined_text()).collect();
        let vectorizer = TextVectorizer::fit(&texts, 2);
        let encoder = CategoricalEncoder::fit(vec![
            (
                "employment_type".to_string(),
                corpus.iter().map(|p| p.employment_type.clone()).collect(),
            ),
            (
                "industry".to_string(),
                corpus.iter().map(|p| p.industry.clone()).collect(),
            ),
        ]);
        Self { vectorizer, encoder }
    }

    /// Construct from already-fitted parts.
    pub fn from_parts(vectorizer: TextVectorizer, encoder: CategoricalEncoder) -> Self {
        Self { vectorizer, encoder }
    }

    /// Extract feature vectors for a posting.
    ///
    /// Deterministic for a given fitted state. Fails with
    /// [`DetectorError::EncoderNotFitted`] if the fitted artifact has not
    /// been loaded.
    pub fn extract(&self, posting: &JobPosting) -> Result<PostingFeatures, DetectorError> {
        let text = self.vectorizer.transform(&posting.combined_text())?;
        let categorical = self
            .encoder
            .transform(&[&posting.employment_type, &posting.industry])?;
        Ok(PostingFeatures { text, categorical })
    }

    pub fn is_fitted(&self) -> bool {
        self.vectorizer.is_fitted() && self.encoder.is_fitted()
    }

    pub fn text_feature_count(&self) -> usize {
        self.vectorizer.feature_count()
    }

    pub fn categorical_feature_count(&self) -> usize {
        self.encoder.feature_count()
    }

    /// Load the fitted extractor from a snapshot directory.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, DetectorError> {
        let path = dir.as_ref().join(PREPROCESSOR_ARTIFACT);
        let file = File::open(&path)?;
        let extractor: Self = serde_json::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            text_features = extractor.text_feature_count(),
            categorical_features = extractor.categorical_feature_count(),
            "Feature extractor loaded"
        );
        Ok(extractor)
    }

    /// Write the fitted extractor into a snapshot directory.
    pub fn save_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<(), DetectorError> {
        let path = dir.as_ref().join(PREPROCESSOR_ARTIFACT);
        let file = File::create(&path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_corpus() -> Vec<JobPosting> {
        let mut a = JobPosting::new("a", "Software engineer");
        a.description = "Build and maintain backend services".to_string();
        a.employment_type = "Full-time".to_string();
        a.industry = "Technology".to_string();

        let mut b = JobPosting::new("b", "Easy money from home");
        b.description = "Earn easy money with no experience".to_string();
        b.employment_type = "Part-time".to_string();
        b.industry = "Other".to_string();

        let mut c = JobPosting::new("c", "Backend engineer");
        c.description = "Backend services in a product team".to_string();
        c.employment_type = "Full-time".to_string();
        c.industry = "Technology".to_string();

        vec![a, b, c]
    }

    #[test]
    fn test_extract_before_fit_fails() {
        let extractor = FeatureExtractor::default();
        let posting = JobPosting::new("x", "Anything");
        assert!(matches!(
            extractor.extract(&posting),
            Err(DetectorError::EncoderNotFitted)
        ));
    }

    #[test]
    fn test_extract_is_deterministic() {
        let corpus = sample_corpus();
        let extractor = FeatureExtractor::fit(&corpus);

        let a = extractor.extract(&corpus[0]).unwrap();
        let b = extractor.extract(&corpus[0]).unwrap();
        assert_eq!(a.text, b.text);
        assert_eq!(a.categorical, b.categorical);
    }

    #[test]
    fn test_artifact_roundtrip_in_dir() {
        let corpus = sample_corpus();
        let extractor = FeatureExtractor::fit(&corpus);

        let dir = tempfile::tempdir().unwrap();
        extractor.save_to_dir(dir.path()).unwrap();
        let loaded = FeatureExtractor::load_from_dir(dir.path()).unwrap();

        assert!(loaded.is_fitted());
        assert_eq!(
            loaded.extract(&corpus[1]).unwrap().text,
            extractor.extract(&corpus[1]).unwrap().text
        );
    }
}
