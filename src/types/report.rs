//! Fraud report data structures

use crate::types::posting::JobPosting;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Coarse risk bucket derived from the consensus fraud probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Tier boundaries are fixed: < 0.3 low, < 0.7 medium, else high.
    pub fn from_probability(probability: f64) -> Self {
        if probability < 0.3 {
            RiskTier::Low
        } else if probability < 0.7 {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }
}

/// Report published for every analyzed posting.
///
/// This is the entire contract the serving layer depends on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudReport {
    /// Unique report identifier
    pub report_id: String,

    /// Identifier of the analyzed posting
    pub posting_id: String,

    /// Consensus verdict (strictly probability > 0.5)
    pub is_fraudulent: bool,

    /// Consensus fraud probability scaled to 0-100
    pub confidence_score: f64,

    /// Risk tier for the posting
    pub risk_tier: RiskTier,

    /// Ranked, deduplicated reasons supporting the verdict
    pub reasons: Vec<String>,

    /// Raw per-model fraud probabilities
    pub model_probabilities: HashMap<String, f64>,

    /// Report generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl FraudReport {
    /// Create a report for a posting.
    pub fn new(
        posting: &JobPosting,
        is_fraudulent: bool,
        confidence_score: f64,
        risk_tier: RiskTier,
        reasons: Vec<String>,
        model_probabilities: HashMap<String, f64>,
    ) -> Self {
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            posting_id: posting.posting_id.clone(),
            is_fraudulent,
            confidence_score,
            risk_tier,
            reasons,
            model_probabilities,
            timestamp: Utc::now(),
        }
    }
}
