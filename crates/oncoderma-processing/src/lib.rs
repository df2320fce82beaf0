//! OncoDerma processing
//!
//! The image-intake pipeline: upload validation, scoped temp files, image
//! probing and the risk scoring engine.

pub mod image;
pub mod pipeline;
pub mod scoring;
pub mod stats;
pub mod temp_file;
pub mod validator;

pub use pipeline::{AnalysisPipeline, CompletedAnalysis};
pub use scoring::{AnalysisError, LatencySimulator, NoDelay, RiskScoringEngine, TokioDelay};
pub use stats::{AnalysisStats, StatsSnapshot};
pub use temp_file::{ScopedTempFile, TempFileManager};
pub use validator::{UploadCandidate, UploadRejection, UploadValidator, ValidationVerdict};
