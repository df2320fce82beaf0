//! Risk scoring: synthetic features, calibrated confidence and guidance

pub mod delay;
pub mod engine;
pub mod features;
pub mod recommendation;

pub use delay::{LatencySimulator, NoDelay, TokioDelay};
pub use engine::{
    fallback_with, score_with, AnalysisError, ModelInfo, RiskScoringEngine, ScoredAnalysis,
    MODEL_VERSION,
};
