pub mod analysis;

pub use analysis::{
    AnalysisMode, AnalysisResponse, AnalysisResult, DimensionsResponse, ImageDimensions,
    ImageMetadata, ImageMetadataResponse, Recommendation, RiskAssessment, RiskFeatures, RiskTier,
    ValidationErrorCode,
};
