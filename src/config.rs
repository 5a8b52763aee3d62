//! Configuration management for the fraud detection service

use crate::explain::ExplanationConfig;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub explanation: ExplanationConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming job postings
    pub posting_subject: String,
    /// Subject for outgoing fraud reports
    pub report_subject: String,
}

/// Ensemble model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory containing the ensemble snapshot (ONNX artifacts,
    /// weights, preprocessor)
    pub models_dir: String,
    /// Per-model ensemble weights; normalized on load
    #[serde(default = "default_model_weights")]
    pub weights: HashMap<String, f64>,
    /// Number of threads for ONNX inference per model (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

fn default_model_weights() -> HashMap<String, f64> {
    let mut weights = HashMap::new();
    weights.insert("logistic_regression".to_string(), 0.25);
    weights.insert("mlp".to_string(), 0.25);
    weights.insert("random_forest".to_string(), 0.25);
    weights.insert("svm".to_string(), 0.25);
    weights
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of parallel prediction workers
    pub workers: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                posting_subject: "postings".to_string(),
                report_subject: "fraud.reports".to_string(),
            },
            models: ModelsConfig {
                models_dir: "models".to_string(),
                weights: default_model_weights(),
                onnx_threads: 1,
            },
            explanation: ExplanationConfig::default(),
            pipeline: PipelineConfig { workers: 4 },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.models.weights.len(), 4);
        assert_eq!(config.explanation.max_reasons, 10);
        assert_eq!(config.explanation.low_significance_floor, 0.25);
    }

    #[test]
    fn test_default_weights_cover_all_families() {
        let weights = default_model_weights();
        let total: f64 = weights.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(weights.contains_key("logistic_regression"));
        assert!(weights.contains_key("svm"));
    }
}
