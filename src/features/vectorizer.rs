//! Fitted TF-IDF text vectorizer.
//!
//! Serving-time counterpart of the training pipeline's text vectorizer:
//! unigram + bigram term frequencies weighted by smoothed inverse document
//! frequency, L2-normalized. The vocabulary and idf table are fitted offline
//! and shipped as part of the preprocessor artifact; transforming before the
//! artifact is loaded is an error.

use crate::error::DetectorError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tokenize into lowercase unigrams and bigrams.
///
/// Splits on non-alphanumeric characters and drops single-character tokens.
fn tokenize(text: &str) -> Vec<String> {
    let words: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(|t| t.to_string())
        .collect();

    let mut terms = Vec::with_capacity(words.len() * 2);
    for pair in words.windows(2) {
        terms.push(format!("{} {}", pair[0], pair[1]));
    }
    terms.extend(words);
    terms
}

/// TF-IDF vectorizer over a fitted vocabulary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextVectorizer {
    /// Term to feature index
    vocabulary: HashMap<String, usize>,
    /// Inverse document frequency per feature index
    idf: Vec<f32>,
}

impl TextVectorizer {
    /// Maximum vocabulary size, matching the training configuration.
    pub const MAX_FEATURES: usize = 5000;

    /// Fit a vocabulary and idf table from a document corpus.
    ///
    /// Terms must appear in at least `min_df` documents; the vocabulary is
    /// capped at `MAX_FEATURES` terms by document frequency. Term order is
    /// made deterministic by sorting ties lexicographically.
    pub fn fit(corpus: &[String], min_df: usize) -> Self {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in corpus {
            let mut seen: Vec<String> = tokenize(doc);
            seen.sort_unstable();
            seen.dedup();
            for term in seen {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<(String, usize)> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= min_df)
            .collect();
        terms.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        terms.truncate(Self::MAX_FEATURES);
        terms.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let n_docs = corpus.len() as f32;
        let mut vocabulary = HashMap::with_capacity(terms.len());
        let mut idf = Vec::with_capacity(terms.len());
        for (index, (term, df)) in terms.into_iter().enumerate() {
            vocabulary.insert(term, index);
            // Smoothed idf, as in the training pipeline.
            idf.push(((1.0 + n_docs) / (1.0 + df as f32)).ln() + 1.0);
        }

        Self { vocabulary, idf }
    }

    /// Whether a fitted vocabulary is present.
    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    /// Number of output features.
    pub fn feature_count(&self) -> usize {
        self.vocabulary.len()
    }

    /// Transform a document into an L2-normalized tf-idf vector.
    pub fn transform(&self, text: &str) -> Result<Vec<f32>, DetectorError> {
        if !self.is_fitted() {
            return Err(DetectorError::EncoderNotFitted);
        }

        let mut vector = vec![0.0f32; self.vocabulary.len()];
        for term in tokenize(text) {
            if let Some(&index) = self.vocabulary.get(&term) {
                vector[index] += 1.0;
            }
        }

        for (index, value) in vector.iter_mut().enumerate() {
            *value *= self.idf[index];
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in vector.iter_mut() {
                *value /= norm;
            }
        }

        Ok(vector)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "earn easy money from home".to_string(),
            "easy money no experience needed".to_string(),
            "software engineer position in berlin".to_string(),
            "senior software engineer role".to_string(),
        ]
    }

    #[test]
    fn test_unfitted_transform_is_an_error() {
        let vectorizer = TextVectorizer::default();
        assert!(matches!(
            vectorizer.transform("anything"),
            Err(DetectorError::EncoderNotFitted)
        ));
    }

    #[test]
    fn test_transform_is_deterministic_and_normalized() {
        let vectorizer = TextVectorizer::fit(&corpus(), 1);
        assert!(vectorizer.is_fitted());

        let a = vectorizer.transform("easy money working from home").unwrap();
        let b = vectorizer.transform("easy money working from home").unwrap();
        assert_eq!(a, b);

        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_min_df_filters_rare_terms() {
        let vectorizer = TextVectorizer::fit(&corpus(), 2);
        // "berlin" appears in one document only.
        assert!(vectorizer.transform("berlin").unwrap().iter().all(|&v| v == 0.0));
        // "easy money" appears in two.
        assert!(vectorizer
            .transform("easy money")
            .unwrap()
            .iter()
            .any(|&v| v > 0.0));
    }

    #[test]
    fn test_artifact_roundtrip() {
        let vectorizer = TextVectorizer::fit(&corpus(), 1);
        let json = serde_json::to_string(&vectorizer).unwrap();
        let back: TextVectorizer = serde_json::from_str(&json).unwrap();

        assert_eq!(back.feature_count(), vectorizer.feature_count());
        assert_eq!(
            back.transform("easy money").unwrap(),
            vectorizer.transform("easy money").unwrap()
        );
    }
}
