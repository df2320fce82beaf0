//! Upload analysis pipeline: validate → persist → decode → score.
//!
//! Validation failures come back as [`UploadRejection`]s for the caller to
//! report. A scoring failure is not a rejection: the engine's fallback estimate
//! is used instead. The temp file is removed before [`AnalysisPipeline::run`]
//! returns on every path.

use std::sync::Arc;

use oncoderma_core::models::{AnalysisMode, ImageMetadata};
use oncoderma_core::Config;

use crate::scoring::{RiskScoringEngine, ScoredAnalysis};
use crate::stats::AnalysisStats;
use crate::temp_file::TempFileManager;
use crate::validator::{UploadCandidate, UploadRejection, UploadValidator};

#[derive(Debug, Clone)]
pub struct CompletedAnalysis {
    pub metadata: ImageMetadata,
    pub analysis: ScoredAnalysis,
}

#[derive(Debug)]
pub struct AnalysisPipeline {
    validator: UploadValidator,
    temp_files: TempFileManager,
    engine: Arc<RiskScoringEngine>,
    stats: Arc<AnalysisStats>,
}

impl AnalysisPipeline {
    pub fn new(
        validator: UploadValidator,
        temp_files: TempFileManager,
        engine: Arc<RiskScoringEngine>,
    ) -> Self {
        Self {
            validator,
            temp_files,
            engine,
            stats: Arc::new(AnalysisStats::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            UploadValidator::from_config(config),
            TempFileManager::new(config.upload_dir.clone()),
            Arc::new(RiskScoringEngine::from_config(config)),
        )
    }

    pub fn validator(&self) -> &UploadValidator {
        &self.validator
    }

    pub fn temp_files(&self) -> &TempFileManager {
        &self.temp_files
    }

    pub fn engine(&self) -> &RiskScoringEngine {
        &self.engine
    }

    pub fn stats(&self) -> &AnalysisStats {
        &self.stats
    }

    pub async fn run(&self, candidate: &UploadCandidate) -> Result<CompletedAnalysis, UploadRejection> {
        let outcome = self.run_inner(candidate).await;

        match &outcome {
            Ok(done) => {
                self.stats.record_completed(
                    done.analysis.processing_time,
                    done.analysis.mode == AnalysisMode::Fallback,
                );
            }
            Err(rejection) => {
                tracing::debug!(
                    code = %rejection.code,
                    content_type = %candidate.content_type,
                    size = candidate.data.len(),
                    "Upload rejected"
                );
                self.stats.record_rejected();
            }
        }

        outcome
    }

    async fn run_inner(&self, candidate: &UploadCandidate) -> Result<CompletedAnalysis, UploadRejection> {
        self.validator
            .validate_then(candidate, &self.temp_files, |path, metadata| async move {
                let analysis = match self.engine.analyze(&path, &metadata).await {
                    Ok(analysis) => analysis,
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            code = %e.code(),
                            "Analysis failed, using fallback estimate"
                        );
                        self.engine.fallback_estimate(&metadata).await
                    }
                };

                CompletedAnalysis { metadata, analysis }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{DimensionReader, ProbeError};
    use crate::scoring::engine::FALLBACK_WARNING;
    use crate::scoring::NoDelay;
    use async_trait::async_trait;
    use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
    use oncoderma_core::models::ValidationErrorCode;
    use std::io::Cursor;
    use std::path::Path;

    struct UnreadableHeader;

    #[async_trait]
    impl DimensionReader for UnreadableHeader {
        async fn dimensions(&self, path: &Path) -> Result<(u32, u32), ProbeError> {
            assert!(path.exists(), "temp file must still exist during analysis");
            Err(ProbeError::Processing("header read failed".to_string()))
        }
    }

    fn validator() -> UploadValidator {
        UploadValidator::new(
            10 * 1024 * 1024,
            vec!["image/jpeg".into(), "image/jpg".into(), "image/png".into()],
            50,
        )
    }

    fn pipeline_with(dir: &Path, engine: RiskScoringEngine) -> AnalysisPipeline {
        AnalysisPipeline::new(validator(), TempFileManager::new(dir), Arc::new(engine))
    }

    fn pipeline(dir: &Path) -> AnalysisPipeline {
        pipeline_with(dir, RiskScoringEngine::seeded(8, Arc::new(NoDelay)))
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img: RgbImage = ImageBuffer::from_pixel(width, height, Rgb([180, 110, 80]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn candidate(data: Vec<u8>, content_type: &str) -> UploadCandidate {
        UploadCandidate {
            data,
            content_type: content_type.to_string(),
            filename: "mole.png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_valid_upload_is_scored_and_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        let done = pipeline.run(&candidate(png(200, 200), "image/png")).await.unwrap();

        assert_eq!(done.metadata.width(), 200);
        assert_eq!(done.metadata.height(), 200);
        assert_eq!(done.analysis.mode, AnalysisMode::Model);
        assert!((5.0..=85.0).contains(&done.analysis.assessment.probability));
        assert!(done.analysis.assessment.confidence <= 0.95);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(pipeline.stats().snapshot().successful_analyses, 1);
    }

    #[tokio::test]
    async fn test_rejections_are_counted_and_leave_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        let cases = [
            (candidate(b"hello".to_vec(), "image/png"), ValidationErrorCode::InvalidFileSignature),
            (candidate(Vec::new(), "image/png"), ValidationErrorCode::EmptyFile),
            (candidate(png(60, 60), "text/plain"), ValidationErrorCode::InvalidFileType),
            (candidate(png(20, 20), "image/png"), ValidationErrorCode::ImageTooSmall),
        ];

        for (candidate, expected) in &cases {
            let rejection = pipeline.run(candidate).await.unwrap_err();
            assert_eq!(rejection.code, *expected);
        }

        let snapshot = pipeline.stats().snapshot();
        assert_eq!(snapshot.rejected_uploads, cases.len() as u64);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_engine_failure_falls_back_instead_of_rejecting() {
        let dir = tempfile::tempdir().unwrap();
        let engine = RiskScoringEngine::seeded(8, Arc::new(NoDelay))
            .with_dimension_reader(Arc::new(UnreadableHeader));
        let pipeline = pipeline_with(dir.path(), engine);

        let done = pipeline.run(&candidate(png(300, 200), "image/png")).await.unwrap();

        assert_eq!(done.analysis.mode, AnalysisMode::Fallback);
        assert!(done.analysis.features.is_none());
        assert!((5.0..=85.0).contains(&done.analysis.assessment.probability));
        assert!(done
            .analysis
            .assessment
            .warnings
            .iter()
            .any(|w| w == FALLBACK_WARNING));
        assert_eq!(done.metadata.width(), 300);

        let snapshot = pipeline.stats().snapshot();
        assert_eq!(snapshot.successful_analyses, 1);
        assert_eq!(snapshot.fallback_analyses, 1);
        assert_eq!(snapshot.rejected_uploads, 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
