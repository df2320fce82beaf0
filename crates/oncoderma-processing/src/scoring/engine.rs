//! Risk scoring engine
//!
//! Turns image metadata into a bounded risk estimate. Randomness comes from an
//! injected [`StdRng`], so a seeded engine is fully reproducible; latency comes
//! from an injected [`LatencySimulator`].

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use oncoderma_core::constants::{PROCESSING_TIME_MAX, PROCESSING_TIME_MIN};
use oncoderma_core::models::{AnalysisMode, ImageMetadata, RiskAssessment, RiskFeatures, ValidationErrorCode};
use oncoderma_core::Config;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::time::Instant;

use super::delay::{LatencySimulator, NoDelay, TokioDelay};
use super::features::{generate_features, image_quality, round_to, weighted_score, REFERENCE_PIXELS};
use super::recommendation::recommend;
use crate::image::{DimensionReader, HeaderDimensionReader};

pub const MODEL_NAME: &str = "SkinCancer AI Detector";
pub const MODEL_VERSION: &str = "1.0.0-simulated";
pub const TRAINING_DATE: &str = "2024-01-01";
pub const MODEL_ACCURACY: f64 = 0.95;

const PHASE_ONE_SECS: (f64, f64) = (0.5, 1.5);
const PHASE_TWO_SECS: (f64, f64) = (1.0, 2.0);
const NOISE_RANGE: (f64, f64) = (-10.0, 10.0);
const PROBABILITY_BOUNDS: (f64, f64) = (5.0, 85.0);
const MAX_CONFIDENCE: f64 = 0.95;

pub const FALLBACK_WARNING: &str = "Result produced by the simplified fallback estimate.";

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("image preprocessing failed: {0}")]
    Preprocessing(String),

    #[error("invalid image metadata: {0}")]
    InvalidMetadata(String),
}

impl AnalysisError {
    pub fn code(&self) -> ValidationErrorCode {
        ValidationErrorCode::AnalysisError
    }
}

/// A finished analysis with its timing
#[derive(Debug, Clone)]
pub struct ScoredAnalysis {
    pub assessment: RiskAssessment,
    pub features: Option<RiskFeatures>,
    pub processing_time: Duration,
    pub mode: AnalysisMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub model_name: &'static str,
    pub version: &'static str,
    pub training_date: &'static str,
    pub accuracy: f64,
    pub is_loaded: bool,
    pub supported_formats: Vec<&'static str>,
    pub analysis_criteria: Vec<&'static str>,
    pub confidence_range: &'static str,
    pub processing_time_range: &'static str,
}

pub struct RiskScoringEngine {
    rng: Mutex<StdRng>,
    delay: Arc<dyn LatencySimulator>,
    reader: Arc<dyn DimensionReader>,
    processing_time_min: f64,
    processing_time_max: f64,
}

impl std::fmt::Debug for RiskScoringEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskScoringEngine")
            .field("processing_time_min", &self.processing_time_min)
            .field("processing_time_max", &self.processing_time_max)
            .finish_non_exhaustive()
    }
}

impl RiskScoringEngine {
    pub fn new(rng: StdRng, delay: Arc<dyn LatencySimulator>) -> Self {
        Self {
            rng: Mutex::new(rng),
            delay,
            reader: Arc::new(HeaderDimensionReader),
            processing_time_min: PROCESSING_TIME_MIN,
            processing_time_max: PROCESSING_TIME_MAX,
        }
    }

    pub fn seeded(seed: u64, delay: Arc<dyn LatencySimulator>) -> Self {
        Self::new(StdRng::seed_from_u64(seed), delay)
    }

    pub fn from_config(config: &Config) -> Self {
        let rng = match config.scoring_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let delay: Arc<dyn LatencySimulator> = if config.simulate_latency {
            Arc::new(TokioDelay)
        } else {
            Arc::new(NoDelay)
        };

        Self::new(rng, delay)
            .with_processing_window(config.processing_time_min, config.processing_time_max)
    }

    /// Bounds of the fallback wait, in seconds
    pub fn with_processing_window(mut self, min_secs: f64, max_secs: f64) -> Self {
        self.processing_time_min = min_secs;
        self.processing_time_max = max_secs;
        self
    }

    /// Replace the header re-read performed by [`Self::analyze`]
    pub fn with_dimension_reader(mut self, reader: Arc<dyn DimensionReader>) -> Self {
        self.reader = reader;
        self
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sample_delay(&self, (lo, hi): (f64, f64)) -> Duration {
        Duration::from_secs_f64(self.rng().random_range(lo..=hi))
    }

    /// Score metadata without any simulated latency
    pub fn score(&self, metadata: &ImageMetadata) -> Result<RiskAssessment, AnalysisError> {
        score_with(&mut *self.rng(), metadata).map(|(assessment, _)| assessment)
    }

    /// Full analysis of a persisted upload: two latency phases around an
    /// independent re-read of the image header, then scoring.
    pub async fn analyze(
        &self,
        path: &Path,
        metadata: &ImageMetadata,
    ) -> Result<ScoredAnalysis, AnalysisError> {
        let start = Instant::now();

        let phase_one = self.sample_delay(PHASE_ONE_SECS);
        self.delay.pause(phase_one).await;

        let (width, height) = self
            .reader
            .dimensions(path)
            .await
            .map_err(|e| AnalysisError::Preprocessing(e.to_string()))?;
        if (width, height) != (metadata.width(), metadata.height()) {
            return Err(AnalysisError::InvalidMetadata(format!(
                "decoded {}x{} but metadata says {}x{}",
                width,
                height,
                metadata.width(),
                metadata.height()
            )));
        }

        let phase_two = self.sample_delay(PHASE_TWO_SECS);
        self.delay.pause(phase_two).await;

        let (assessment, features) = score_with(&mut *self.rng(), metadata)?;

        Ok(ScoredAnalysis {
            assessment,
            features: Some(features),
            processing_time: start.elapsed(),
            mode: AnalysisMode::Model,
        })
    }

    /// Simplified estimate used when [`Self::analyze`] fails
    pub async fn fallback_estimate(&self, metadata: &ImageMetadata) -> ScoredAnalysis {
        let start = Instant::now();

        let megapixels = metadata.pixel_count() as f64 / REFERENCE_PIXELS;
        let wait = (self.processing_time_min + megapixels * 0.5).min(self.processing_time_max);
        self.delay.pause(Duration::from_secs_f64(wait.max(0.0))).await;

        let assessment = fallback_with(&mut *self.rng(), metadata);

        ScoredAnalysis {
            assessment,
            features: None,
            processing_time: start.elapsed(),
            mode: AnalysisMode::Fallback,
        }
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            model_name: MODEL_NAME,
            version: MODEL_VERSION,
            training_date: TRAINING_DATE,
            accuracy: MODEL_ACCURACY,
            is_loaded: true,
            supported_formats: vec!["JPEG", "PNG"],
            analysis_criteria: vec!["Asymmetry", "Border", "Color", "Diameter", "Texture"],
            confidence_range: "0.70 - 0.95",
            processing_time_range: "2-5 seconds",
        }
    }
}

/// Deterministic given `rng`: same generator state, same metadata, same result
pub fn score_with<R: Rng + ?Sized>(
    rng: &mut R,
    metadata: &ImageMetadata,
) -> Result<(RiskAssessment, RiskFeatures), AnalysisError> {
    let (width, height) = (metadata.width(), metadata.height());
    if width == 0 || height == 0 {
        return Err(AnalysisError::InvalidMetadata(format!(
            "image has no pixels ({}x{})",
            width, height
        )));
    }

    let quality = image_quality(width, height);
    let features = generate_features(rng, width, height);
    let score = weighted_score(&features);

    let noise = rng.random_range(NOISE_RANGE.0..=NOISE_RANGE.1);
    let probability = round_to(
        (score * 100.0 + noise).clamp(PROBABILITY_BOUNDS.0, PROBABILITY_BOUNDS.1),
        1,
    );

    let confidence = round_to(
        (0.80 + 0.15 * quality + 0.05 * (1.0 - (0.5 - score).abs())).clamp(0.0, MAX_CONFIDENCE),
        2,
    );

    let (recommendation, warnings) = recommend(probability, confidence, quality);

    Ok((
        RiskAssessment {
            probability,
            confidence,
            image_quality: round_to(quality, 3),
            recommendation,
            warnings,
        },
        features,
    ))
}

/// Weighted draw over three probability bands, nudged by image size
pub fn fallback_with<R: Rng + ?Sized>(rng: &mut R, metadata: &ImageMetadata) -> RiskAssessment {
    let min_side = f64::from(metadata.min_side());

    let roll: f64 = rng.random_range(0.0..1.0);
    let base = if roll < 0.7 {
        rng.random_range(5.0..=25.0)
    } else if roll < 0.9 {
        rng.random_range(25.0..=55.0)
    } else {
        rng.random_range(55.0..=85.0)
    };
    let adjustment = rng.random_range(-5.0..=5.0) * min_side / 1000.0;

    let probability = round_to(
        (base + adjustment).clamp(PROBABILITY_BOUNDS.0, PROBABILITY_BOUNDS.1),
        1,
    );
    let confidence = round_to((0.85 + min_side / 1000.0 * 0.1).min(MAX_CONFIDENCE), 2);
    let quality = if metadata.width() > 0 && metadata.height() > 0 {
        image_quality(metadata.width(), metadata.height())
    } else {
        0.3
    };

    let (recommendation, mut warnings) = recommend(probability, confidence, quality);
    warnings.push(FALLBACK_WARNING.to_string());

    RiskAssessment {
        probability,
        confidence,
        image_quality: round_to(quality, 3),
        recommendation,
        warnings,
    }
}
