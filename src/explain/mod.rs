//! Evidence synthesis: rule catalogue and explanation engine.

pub mod engine;
pub mod rules;

pub use engine::{ExplanationConfig, ExplanationEngine, FALLBACK_REASON, NO_WARNING_REASON};
pub use rules::{Rule, RuleCategory, RuleSet};
