//! Consensus aggregation across model verdicts.
//!
//! Combines the per-model fraud probabilities into one weighted score, an
//! agreement percentage, and a confidence measure derived from cross-model
//! variance. Pure and deterministic given its inputs.

use crate::error::DetectorError;
use crate::models::adapter::ModelVerdict;
use crate::types::RiskTier;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Per-model weights, normalized to sum to 1 after every assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelWeights {
    weights: HashMap<String, f64>,
}

impl ModelWeights {
    /// Equal weighting across the given model identifiers.
    pub fn equal<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let share = if names.is_empty() {
            0.0
        } else {
            1.0 / names.len() as f64
        };
        Self {
            weights: names.into_iter().map(|n| (n, share)).collect(),
        }
    }

    /// Build from an explicit weight map.
    ///
    /// Weights must be finite and non-negative with a positive sum; they are
    /// normalized to sum to 1.
    pub fn from_map(weights: HashMap<String, f64>) -> Result<Self, DetectorError> {
        let mut normalized = Self { weights };
        normalized.normalize()?;
        Ok(normalized)
    }

    /// Merge overrides into the current weights and renormalize.
    ///
    /// Overrides are validated before merging so a rejected assignment
    /// leaves the current snapshot untouched.
    pub fn assign(&mut self, overrides: HashMap<String, f64>) -> Result<(), DetectorError> {
        for (name, weight) in &overrides {
            if !weight.is_finite() {
                return Err(DetectorError::InvalidWeights(format!(
                    "weight for '{name}' is not a finite number"
                )));
            }
            if *weight < 0.0 {
                return Err(DetectorError::InvalidWeights(format!(
                    "weight for '{name}' is negative"
                )));
            }
        }
        for (name, weight) in overrides {
            self.weights.insert(name, weight);
        }
        self.normalize()
    }

    fn normalize(&mut self) -> Result<(), DetectorError> {
        for (name, weight) in &self.weights {
            if !weight.is_finite() {
                return Err(DetectorError::InvalidWeights(format!(
                    "weight for '{name}' is not a finite number"
                )));
            }
            if *weight < 0.0 {
                return Err(DetectorError::InvalidWeights(format!(
                    "weight for '{name}' is negative"
                )));
            }
        }
        let total: f64 = self.weights.values().sum();
        if total <= 0.0 {
            return Err(DetectorError::InvalidWeights(
                "weights sum to zero".to_string(),
            ));
        }
        for weight in self.weights.values_mut() {
            *weight /= total;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.weights.get(name).copied()
    }

    pub fn as_map(&self) -> &HashMap<String, f64> {
        &self.weights
    }

    /// Weights restricted to the available models, renormalized to sum to 1.
    ///
    /// Models missing from the configuration get weight 0 before
    /// renormalizing. If the restricted weights sum to zero, falls back to
    /// equal weighting over the available models so a prediction can still
    /// be produced.
    fn restricted_to(&self, names: &[&str]) -> Vec<f64> {
        let raw: Vec<f64> = names
            .iter()
            .map(|n| self.weights.get(*n).copied().unwrap_or(0.0))
            .collect();
        let total: f64 = raw.iter().sum();
        if total > 0.0 {
            raw.into_iter().map(|w| w / total).collect()
        } else {
            warn!(
                models = ?names,
                "No configured weight among available models, using equal weights"
            );
            vec![1.0 / names.len() as f64; names.len()]
        }
    }
}

/// Aggregated decision across all available model verdicts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Weighted mean of per-model fraud probabilities
    pub fraud_probability: f64,
    /// Share of models voting fraudulent (probability > 0.5), in percent
    pub agreement_percent: f64,
    /// Inter-model agreement measure in [0, 1]
    pub confidence: f64,
    /// Coarse bucket derived from the fraud probability
    pub risk_tier: RiskTier,
    /// Strictly probability > 0.5; exactly 0.5 classifies as legitimate
    pub is_fraudulent: bool,
}

/// Combines per-model verdicts into a [`ConsensusResult`].
pub struct ConsensusAggregator;

impl ConsensusAggregator {
    /// Aggregate verdicts from the models that successfully scored.
    ///
    /// `weights` are restricted to the available models and renormalized;
    /// with no weights supplied the mean is unweighted. Zero verdicts is a
    /// hard error; the aggregator never substitutes a default probability.
    pub fn aggregate(
        verdicts: &[(String, ModelVerdict)],
        weights: Option<&ModelWeights>,
    ) -> Result<ConsensusResult, DetectorError> {
        if verdicts.is_empty() {
            return Err(DetectorError::NoScorableModel);
        }

        let names: Vec<&str> = verdicts.iter().map(|(n, _)| n.as_str()).collect();
        let shares = match weights {
            Some(w) => w.restricted_to(&names),
            None => vec![1.0 / verdicts.len() as f64; verdicts.len()],
        };

        let fraud_probability: f64 = verdicts
            .iter()
            .zip(&shares)
            .map(|((_, v), w)| w * v.probability)
            .sum::<f64>()
            .clamp(0.0, 1.0);

        let fraud_votes = verdicts.iter().filter(|(_, v)| v.probability > 0.5).count();
        let agreement_percent = fraud_votes as f64 / verdicts.len() as f64 * 100.0;

        // Weighted population variance; bounded by 0.25 for probabilities,
        // so the 4x scale maps total disagreement to confidence 0.
        let variance: f64 = verdicts
            .iter()
            .zip(&shares)
            .map(|((_, v), w)| w * (v.probability - fraud_probability).powi(2))
            .sum();
        let confidence = (1.0 - 4.0 * variance).clamp(0.0, 1.0);

        Ok(ConsensusResult {
            fraud_probability,
            agreement_percent,
            confidence,
            risk_tier: RiskTier::from_probability(fraud_probability),
            is_fraudulent: fraud_probability > 0.5,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdicts(pairs: &[(&str, f64)]) -> Vec<(String, ModelVerdict)> {
        pairs
            .iter()
            .map(|(n, p)| (n.to_string(), ModelVerdict::new(*p)))
            .collect()
    }

    #[test]
    fn test_reference_ensemble_numbers() {
        let verdicts = verdicts(&[
            ("logistic_regression", 0.9),
            ("mlp", 0.85),
            ("random_forest", 0.95),
            ("svm", 0.88),
        ]);

        let result = ConsensusAggregator::aggregate(&verdicts, None).unwrap();

        assert!((result.fraud_probability - 0.895).abs() < 1e-9);
        assert_eq!(result.agreement_percent, 100.0);
        assert!((result.confidence - 0.9947).abs() < 1e-3);
        assert_eq!(result.risk_tier, RiskTier::High);
        assert!(result.is_fraudulent);
    }

    #[test]
    fn test_weighted_mean_matches_weights() {
        let verdicts = verdicts(&[("a", 0.2), ("b", 0.8)]);
        let weights = ModelWeights::from_map(HashMap::from([
            ("a".to_string(), 3.0),
            ("b".to_string(), 1.0),
        ]))
        .unwrap();

        let result = ConsensusAggregator::aggregate(&verdicts, Some(&weights)).unwrap();
        assert!((result.fraud_probability - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_zero_models_is_an_error() {
        assert!(matches!(
            ConsensusAggregator::aggregate(&[], None),
            Err(DetectorError::NoScorableModel)
        ));
    }

    #[test]
    fn test_identical_probabilities_give_full_confidence() {
        let verdicts = verdicts(&[("a", 0.6), ("b", 0.6), ("c", 0.6)]);
        let result = ConsensusAggregator::aggregate(&verdicts, None).unwrap();
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_confidence_decreases_with_variance() {
        let close = ConsensusAggregator::aggregate(&verdicts(&[("a", 0.55), ("b", 0.65)]), None)
            .unwrap();
        let spread = ConsensusAggregator::aggregate(&verdicts(&[("a", 0.2), ("b", 1.0)]), None)
            .unwrap();
        assert!(close.confidence > spread.confidence);
    }

    #[test]
    fn test_total_disagreement_clamps_to_zero_confidence() {
        let result =
            ConsensusAggregator::aggregate(&verdicts(&[("a", 0.0), ("b", 1.0)]), None).unwrap();
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.fraud_probability, 0.5);
        // Exactly 0.5 classifies as legitimate.
        assert!(!result.is_fraudulent);
    }

    #[test]
    fn test_dropped_model_renormalizes_weights() {
        let weights = ModelWeights::from_map(HashMap::from([
            ("a".to_string(), 0.5),
            ("b".to_string(), 0.3),
            ("c".to_string(), 0.2),
        ]))
        .unwrap();

        // "c" failed to score; remaining weights renormalize to 0.625/0.375.
        let verdicts = verdicts(&[("a", 0.8), ("b", 0.4)]);
        let result = ConsensusAggregator::aggregate(&verdicts, Some(&weights)).unwrap();
        assert!((result.fraud_probability - (0.625 * 0.8 + 0.375 * 0.4)).abs() < 1e-9);
    }

    #[test]
    fn test_probability_stays_in_unit_interval() {
        let result =
            ConsensusAggregator::aggregate(&verdicts(&[("a", 1.0), ("b", 1.0)]), None).unwrap();
        assert!(result.fraud_probability <= 1.0);
        assert_eq!(result.risk_tier, RiskTier::High);
    }

    #[test]
    fn test_agreement_percent_counts_strict_majority_votes() {
        let result = ConsensusAggregator::aggregate(
            &verdicts(&[("a", 0.9), ("b", 0.5), ("c", 0.2), ("d", 0.7)]),
            None,
        )
        .unwrap();
        // 0.5 is not a fraud vote.
        assert_eq!(result.agreement_percent, 50.0);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let result = ModelWeights::from_map(HashMap::from([("a".to_string(), -0.2)]));
        assert!(matches!(result, Err(DetectorError::InvalidWeights(_))));
    }

    #[test]
    fn test_nan_weight_rejected() {
        let result = ModelWeights::from_map(HashMap::from([("a".to_string(), f64::NAN)]));
        assert!(matches!(result, Err(DetectorError::InvalidWeights(_))));
    }

    #[test]
    fn test_rejected_assign_leaves_snapshot_untouched() {
        let mut weights = ModelWeights::equal(["a", "b"]);
        let before = weights.as_map().clone();

        let result = weights.assign(HashMap::from([("a".to_string(), f64::INFINITY)]));
        assert!(matches!(result, Err(DetectorError::InvalidWeights(_))));
        assert_eq!(weights.as_map(), &before);
    }

    #[test]
    fn test_assign_renormalizes_to_unit_sum() {
        let mut weights = ModelWeights::equal(["a", "b", "c", "d"]);
        weights
            .assign(HashMap::from([("a".to_string(), 2.0)]))
            .unwrap();

        let total: f64 = weights.as_map().values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(weights.get("a").unwrap() > weights.get("b").unwrap());
    }
}
