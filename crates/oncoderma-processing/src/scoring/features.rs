//! Feature generation and the weighted risk score

use oncoderma_core::models::RiskFeatures;
use rand::Rng;

/// Pixel count treated as full resolution (1024 x 1024)
pub const REFERENCE_PIXELS: f64 = 1_048_576.0;

pub const ASYMMETRY_RANGE: (f64, f64) = (0.1, 0.9);
pub const BORDER_RANGE: (f64, f64) = (0.0, 0.8);
pub const COLOR_RANGE: (f64, f64) = (0.2, 0.7);
pub const TEXTURE_RANGE: (f64, f64) = (0.3, 0.9);
pub const CONTRAST_RANGE: (f64, f64) = (0.4, 0.8);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureWeights {
    pub asymmetry: f64,
    pub border: f64,
    pub color: f64,
    pub diameter: f64,
    pub texture: f64,
    pub contrast: f64,
}

pub const WEIGHTS: FeatureWeights = FeatureWeights {
    asymmetry: 0.25,
    border: 0.20,
    color: 0.20,
    diameter: 0.15,
    texture: 0.10,
    contrast: 0.10,
};

/// 0.7 x resolution score + 0.3 x aspect score, clamped to [0.3, 1.0]
pub fn image_quality(width: u32, height: u32) -> f64 {
    let pixels = f64::from(width) * f64::from(height);
    let resolution_score = (pixels / REFERENCE_PIXELS).min(1.0);
    let aspect_ratio = f64::from(width) / f64::from(height);
    let aspect_score = 1.0 - 0.5 * (1.0 - aspect_ratio).abs();

    (0.7 * resolution_score + 0.3 * aspect_score).clamp(0.3, 1.0)
}

fn sample<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (f64, f64)) -> f64 {
    rng.random_range(lo..=hi)
}

pub fn generate_features<R: Rng + ?Sized>(rng: &mut R, width: u32, height: u32) -> RiskFeatures {
    RiskFeatures {
        asymmetry: sample(rng, ASYMMETRY_RANGE),
        border_irregularity: sample(rng, BORDER_RANGE),
        color_variation: sample(rng, COLOR_RANGE),
        diameter_factor: f64::from(width.min(height)) / 100.0,
        texture_complexity: sample(rng, TEXTURE_RANGE),
        contrast_level: sample(rng, CONTRAST_RANGE),
    }
}

pub fn weighted_score(features: &RiskFeatures) -> f64 {
    features.asymmetry * WEIGHTS.asymmetry
        + features.border_irregularity * WEIGHTS.border
        + features.color_variation * WEIGHTS.color
        + features.diameter_factor * WEIGHTS.diameter
        + features.texture_complexity * WEIGHTS.texture
        + features.contrast_level * WEIGHTS.contrast
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
