use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Machine-readable outcome codes of the upload route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorCode {
    NoFile,
    InvalidFileType,
    FileSizeExceeded,
    InvalidFileSignature,
    EmptyFile,
    InvalidImage,
    ImageTooSmall,
    ImageProcessingError,
    AnalysisError,
}

impl ValidationErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorCode::NoFile => "NO_FILE",
            ValidationErrorCode::InvalidFileType => "INVALID_FILE_TYPE",
            ValidationErrorCode::FileSizeExceeded => "FILE_SIZE_EXCEEDED",
            ValidationErrorCode::InvalidFileSignature => "INVALID_FILE_SIGNATURE",
            ValidationErrorCode::EmptyFile => "EMPTY_FILE",
            ValidationErrorCode::InvalidImage => "INVALID_IMAGE",
            ValidationErrorCode::ImageTooSmall => "IMAGE_TOO_SMALL",
            ValidationErrorCode::ImageProcessingError => "IMAGE_PROCESSING_ERROR",
            ValidationErrorCode::AnalysisError => "ANALYSIS_ERROR",
        }
    }
}

impl std::fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Decoded facts about an accepted upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Byte size of the upload
    pub size: usize,
    /// Declared content type, normalized
    #[serde(rename = "type")]
    pub content_type: String,
    pub dimensions: ImageDimensions,
    /// Decoded container format ("PNG", "JPEG")
    pub format: String,
    /// Color mode of the decoded pixels ("RGB", "RGBA", "L", ...)
    pub mode: String,
}

impl ImageMetadata {
    pub fn width(&self) -> u32 {
        self.dimensions.width
    }

    pub fn height(&self) -> u32 {
        self.dimensions.height
    }

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    pub fn min_side(&self) -> u32 {
        self.width().min(self.height())
    }
}

/// Wire form of [`ImageMetadata`]: format and mode live next to the dimensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMetadataResponse {
    pub size: usize,
    #[serde(rename = "type")]
    pub content_type: String,
    pub dimensions: DimensionsResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionsResponse {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub mode: String,
}

impl From<&ImageMetadata> for ImageMetadataResponse {
    fn from(meta: &ImageMetadata) -> Self {
        Self {
            size: meta.size,
            content_type: meta.content_type.clone(),
            dimensions: DimensionsResponse {
                width: meta.dimensions.width,
                height: meta.dimensions.height,
                format: meta.format.clone(),
                mode: meta.mode.clone(),
            },
        }
    }
}

/// Synthetic ABCDE-style scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFeatures {
    pub asymmetry: f64,
    pub border_irregularity: f64,
    pub color_variation: f64,
    pub diameter_factor: f64,
    pub texture_complexity: f64,
    pub contrast_level: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub urgency_level: RiskTier,
    pub follow_up_recommended: bool,
    pub specialist_consultation: bool,
    pub monitoring_frequency: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub additional_tests: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_quality_warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Percentage in [5, 85], one decimal place
    pub probability: f64,
    /// In [0, 0.95], two decimal places
    pub confidence: f64,
    pub image_quality: f64,
    pub recommendation: Recommendation,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    Model,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub probability: f64,
    pub confidence: f64,
    /// Seconds spent in analysis
    pub processing_time: f64,
    pub timestamp: DateTime<Utc>,
    pub model_version: String,
    pub analysis_mode: AnalysisMode,
    pub image_quality_score: f64,
    pub image_metadata: ImageMetadataResponse,
    pub recommendations: Recommendation,
    pub warnings: Vec<String>,
}

/// Body of `POST /api/analysis/upload`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ValidationErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AnalysisResponse {
    pub fn completed(result: AnalysisResult) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            message: Some("Analysis completed successfully".to_string()),
        }
    }

    pub fn rejected(code: ValidationErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(code),
            message: Some(message.into()),
        }
    }
}
