//! Model adapters, consensus aggregation, and the ensemble facade.

pub mod adapter;
pub mod consensus;
pub mod ensemble;
pub mod loader;
pub mod onnx;

pub use adapter::{FeatureKind, FraudModel, ModelVerdict};
pub use consensus::{ConsensusAggregator, ConsensusResult, ModelWeights};
pub use ensemble::{EnsembleDetector, Prediction};
pub use loader::ModelLoader;
pub use onnx::OnnxModel;
