//! Job Posting Fraud Detection Library
//!
//! Scores job postings with an ensemble of independently trained
//! classifiers, aggregates the per-model probabilities into a consensus
//! verdict, and derives a ranked, human-readable explanation.

pub mod config;
pub mod consumer;
pub mod error;
pub mod explain;
pub mod features;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod types;

pub use config::AppConfig;
pub use consumer::PostingConsumer;
pub use error::DetectorError;
pub use explain::{ExplanationConfig, ExplanationEngine};
pub use features::FeatureExtractor;
pub use models::{ConsensusAggregator, EnsembleDetector, FraudModel, ModelWeights};
pub use producer::ReportProducer;
pub use types::{FraudReport, JobPosting, RiskTier};
