//! Lesion image analysis endpoints

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use chrono::{DateTime, Utc};
use oncoderma_core::constants::SERVICE_VERSION;
use oncoderma_core::models::{
    AnalysisResponse, AnalysisResult, ImageMetadataResponse, ValidationErrorCode,
};
use oncoderma_core::AppError;
use oncoderma_processing::scoring::features::round_to;
use oncoderma_processing::scoring::{ModelInfo, MODEL_VERSION};
use oncoderma_processing::{CompletedAnalysis, StatsSnapshot, UploadCandidate};
use serde::Serialize;

use crate::auth::OptionalUser;
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::extract_multipart_file;

fn into_result(done: CompletedAnalysis) -> AnalysisResult {
    let CompletedAnalysis { metadata, analysis } = done;
    let assessment = analysis.assessment;

    AnalysisResult {
        probability: assessment.probability,
        confidence: assessment.confidence,
        processing_time: round_to(analysis.processing_time.as_secs_f64(), 3),
        timestamp: Utc::now(),
        model_version: MODEL_VERSION.to_string(),
        analysis_mode: analysis.mode,
        image_quality_score: assessment.image_quality,
        image_metadata: ImageMetadataResponse::from(&metadata),
        recommendations: assessment.recommendation,
        warnings: assessment.warnings,
    }
}

/// `POST /api/analysis/upload`
///
/// Validation problems come back as `success: false` with a code; only
/// transport-level problems (malformed multipart, oversized body) are errors.
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    OptionalUser(user): OptionalUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResponse>, HttpAppError> {
    let multipart = multipart
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart request: {}", e.body_text())))?;

    let Some(file) = extract_multipart_file(multipart).await? else {
        return Ok(Json(AnalysisResponse::rejected(
            ValidationErrorCode::NoFile,
            "No file was provided",
        )));
    };

    let username = user.as_ref().map(|u| u.username.as_str());
    tracing::info!(
        filename = %file.filename,
        content_type = %file.content_type,
        size = file.data.len(),
        user = username.unwrap_or("anonymous"),
        "Analysis requested"
    );

    let candidate = UploadCandidate {
        data: file.data,
        content_type: file.content_type,
        filename: file.filename,
    };

    match state.pipeline.run(&candidate).await {
        Ok(done) => {
            let result = into_result(done);
            tracing::info!(
                probability = result.probability,
                confidence = result.confidence,
                mode = ?result.analysis_mode,
                user = username.unwrap_or("anonymous"),
                "Analysis completed"
            );
            Ok(Json(AnalysisResponse::completed(result)))
        }
        Err(rejection) => Ok(Json(AnalysisResponse::rejected(
            rejection.code,
            rejection.message,
        ))),
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisLimits {
    pub max_file_size_mb: f64,
    pub allowed_types: Vec<String>,
    pub min_dimensions: String,
    pub processing_time_range: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisHealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub limits: AnalysisLimits,
    pub timestamp: DateTime<Utc>,
}

/// `GET /api/analysis/health`
pub async fn analysis_health(State(state): State<Arc<AppState>>) -> Json<AnalysisHealthResponse> {
    let config = &state.config;
    Json(AnalysisHealthResponse {
        status: "healthy",
        service: "analysis",
        version: SERVICE_VERSION,
        limits: AnalysisLimits {
            max_file_size_mb: config.max_file_size_mb(),
            allowed_types: config.allowed_content_types.clone(),
            min_dimensions: format!(
                "{}x{}",
                config.min_image_dimension, config.min_image_dimension
            ),
            processing_time_range: format!(
                "{}-{} seconds",
                config.processing_time_min, config.processing_time_max
            ),
        },
        timestamp: Utc::now(),
    })
}

/// `GET /api/analysis/model-info`
pub async fn model_info(State(state): State<Arc<AppState>>) -> Json<ModelInfo> {
    Json(state.pipeline.engine().model_info())
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    pub model_info: ModelInfo,
    pub timestamp: DateTime<Utc>,
}

/// `GET /api/analysis/stats`
pub async fn analysis_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        stats: state.pipeline.stats().snapshot(),
        model_info: state.pipeline.engine().model_info(),
        timestamp: Utc::now(),
    })
}
