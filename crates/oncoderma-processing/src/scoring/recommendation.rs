//! Probability tiers and follow-up guidance

use oncoderma_core::models::{Recommendation, RiskTier};

pub const LOW_RISK_CEILING: f64 = 30.0;
pub const MODERATE_RISK_CEILING: f64 = 60.0;
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.70;
pub const LOW_QUALITY_THRESHOLD: f64 = 0.50;

pub const LOW_CONFIDENCE_NOTE: &str =
    "Note: analysis confidence is low, repeat with a better quality image.";
pub const IMAGE_QUALITY_WARNING: &str = "Image quality may affect the accuracy of the analysis.";

pub fn tier_for(probability: f64) -> RiskTier {
    if probability <= LOW_RISK_CEILING {
        RiskTier::Low
    } else if probability <= MODERATE_RISK_CEILING {
        RiskTier::Moderate
    } else {
        RiskTier::High
    }
}

/// Guidance for a result, plus the warnings it raised
pub fn recommend(probability: f64, confidence: f64, image_quality: f64) -> (Recommendation, Vec<String>) {
    let tier = tier_for(probability);
    let mut warnings = Vec::new();

    let mut recommendation = match tier {
        RiskTier::Low => Recommendation {
            urgency_level: tier,
            follow_up_recommended: true,
            specialist_consultation: false,
            monitoring_frequency: "annual".to_string(),
            message: "Low risk detected. Continue with regular check-ups.".to_string(),
            additional_tests: Vec::new(),
            image_quality_warning: None,
        },
        RiskTier::Moderate => Recommendation {
            urgency_level: tier,
            follow_up_recommended: true,
            specialist_consultation: true,
            monitoring_frequency: "semi-annual".to_string(),
            message: "Moderate risk. A dermatologist consultation is recommended.".to_string(),
            additional_tests: Vec::new(),
            image_quality_warning: None,
        },
        RiskTier::High => Recommendation {
            urgency_level: tier,
            follow_up_recommended: true,
            specialist_consultation: true,
            monitoring_frequency: "quarterly".to_string(),
            message: "High risk detected. See a dermatologist as soon as possible.".to_string(),
            additional_tests: vec!["dermoscopy".to_string(), "biopsy_consideration".to_string()],
            image_quality_warning: None,
        },
    };

    if confidence < LOW_CONFIDENCE_THRESHOLD {
        recommendation.message.push(' ');
        recommendation.message.push_str(LOW_CONFIDENCE_NOTE);
        warnings.push(LOW_CONFIDENCE_NOTE.to_string());
    }

    if image_quality < LOW_QUALITY_THRESHOLD {
        recommendation.image_quality_warning = Some(IMAGE_QUALITY_WARNING.to_string());
        warnings.push(IMAGE_QUALITY_WARNING.to_string());
    }

    (recommendation, warnings)
}
