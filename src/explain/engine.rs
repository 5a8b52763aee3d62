//! Explanation engine: candidate collection, deduplication, ranking.

use crate::explain::rules::{RuleContext, RuleSet};
use crate::models::adapter::ModelVerdict;
use crate::models::consensus::ConsensusResult;
use crate::types::JobPosting;
use serde::Deserialize;
use tracing::warn;

/// Emitted when the posting shows no meaningful fraud signal.
pub const NO_WARNING_REASON: &str = "No significant warning signs detected.";

/// Emitted when a posting is flagged but no specific rule produced evidence.
/// The explanation contract guarantees at least one reason for a fraudulent
/// verdict.
pub const FALLBACK_REASON: &str = "Multiple suspicious elements detected in this posting.";

/// Tuning knobs for ensemble explanations.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplanationConfig {
    /// Maximum reasons in an ensemble explanation
    #[serde(default = "default_max_reasons")]
    pub max_reasons: usize,
    /// Below this consensus probability, detailed scanning is skipped
    #[serde(default = "default_low_significance_floor")]
    pub low_significance_floor: f64,
}

fn default_max_reasons() -> usize {
    10
}

fn default_low_significance_floor() -> f64 {
    0.25
}

impl Default for ExplanationConfig {
    fn default() -> Self {
        Self {
            max_reasons: default_max_reasons(),
            low_significance_floor: default_low_significance_floor(),
        }
    }
}

/// Derives, deduplicates, and ranks the reasons a posting was flagged.
pub struct ExplanationEngine {
    rules: RuleSet,
    config: ExplanationConfig,
}

impl ExplanationEngine {
    pub fn new(config: ExplanationConfig) -> Self {
        Self {
            rules: RuleSet::standard(),
            config,
        }
    }

    /// Produce the ordered reason list for a scored posting.
    ///
    /// Low-risk postings get the single no-warning reason; detailed scanning
    /// is skipped so no spurious evidence is manufactured for them. For
    /// flagged postings every rule runs, model-supplied reasons are merged
    /// in, and candidates are deduplicated by exact string while counting
    /// occurrences; a reason surfaced by several independent contributors
    /// ranks higher. Ties keep first-seen order. A failing contributor is
    /// logged and skipped, never fatal.
    pub fn explain(
        &self,
        posting: &JobPosting,
        consensus: &ConsensusResult,
        verdicts: &[(String, ModelVerdict)],
    ) -> Vec<String> {
        if !consensus.is_fraudulent
            || consensus.fraud_probability < self.config.low_significance_floor
        {
            return vec![NO_WARNING_REASON.to_string()];
        }

        let ctx = RuleContext::new(posting, consensus, verdicts);
        let mut candidates: Vec<String> = Vec::new();

        for rule in self.rules.rules() {
            match rule.matches(&ctx) {
                Ok(true) => candidates.push(rule.message.to_string()),
                Ok(false) => {}
                Err(e) => {
                    warn!(category = ?rule.category, error = %e, "Rule evaluation failed, skipping");
                }
            }
        }

        for (_, verdict) in verdicts {
            candidates.extend(verdict.reasons.iter().cloned());
        }

        let mut ranked = rank_candidates(candidates);
        ranked.truncate(self.config.max_reasons);

        if ranked.is_empty() {
            ranked.push(FALLBACK_REASON.to_string());
        }
        ranked
    }
}

/// Deduplicate by exact string, rank by descending occurrence count, stable
/// on first-seen order for ties.
fn rank_candidates(candidates: Vec<String>) -> Vec<String> {
    let mut unique: Vec<(String, usize)> = Vec::new();
    for candidate in candidates {
        match unique.iter_mut().find(|(reason, _)| *reason == candidate) {
            Some((_, count)) => *count += 1,
            None => unique.push((candidate, 1)),
        }
    }
    // Stable sort preserves discovery order among equal counts.
    unique.sort_by(|a, b| b.1.cmp(&a.1));
    unique.into_iter().map(|(reason, _)| reason).collect()
}
