//! Inference module
//!
//! Scores encoded survey answers against a [`TrainedModelBundle`]:
//! - Feature names are checked against the bundle's training order
//! - The stored scaler is applied without refitting
//! - The High-stress probability is cut at the calibrated threshold
//!
//! [`InferenceEngine`] wraps a shared bundle and encoding maps for raw
//! [`SurveyInput`](crate::preprocessing::SurveyInput) queries.

mod engine;

pub use engine::InferenceEngine;

use crate::error::{Result, StressError};
use crate::preprocessing::{EncodedRecord, StressLevel};
use crate::training::TrainedModelBundle;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Margin within which a prediction is flagged as borderline
pub const BOUNDARY_MARGIN: f64 = 0.10;

/// Slack for floating-point error when comparing against [`BOUNDARY_MARGIN`]
const MARGIN_TOLERANCE: f64 = 1e-9;

/// Outcome of scoring one record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub level: StressLevel,
    /// Probability of High stress
    pub probability: f64,
    pub threshold: f64,
}

impl Prediction {
    pub fn new(probability: f64, threshold: f64) -> Self {
        Self {
            level: StressLevel::from_probability(probability, threshold),
            probability,
            threshold,
        }
    }

    /// Distance between the probability and the threshold
    pub fn margin(&self) -> f64 {
        (self.probability - self.threshold).abs()
    }

    pub fn is_near_boundary(&self) -> bool {
        self.margin() <= BOUNDARY_MARGIN + MARGIN_TOLERANCE
    }
}

/// Score one encoded record
pub fn predict(bundle: &TrainedModelBundle, record: &EncodedRecord) -> Result<Prediction> {
    check_features(bundle.feature_names(), record.feature_names())?;

    let scaled = bundle
        .scaler()
        .transform_row(ArrayView1::from(record.values()))?;
    let class_probs = bundle.classifier().predict_proba_row(scaled.view())?;

    let high = StressLevel::High.code();
    let probability = bundle
        .classifier()
        .classes()
        .iter()
        .position(|&c| c == high)
        .map_or(0.0, |i| class_probs[i])
        .clamp(0.0, 1.0);

    Ok(Prediction::new(probability, bundle.threshold()))
}

fn check_features(expected: &[String], actual: &[String]) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(StressError::ShapeError {
            expected: format!("{} features", expected.len()),
            actual: format!("{} features", actual.len()),
        });
    }
    match expected.iter().zip(actual).position(|(e, a)| e != a) {
        Some(position) => Err(StressError::FeatureMismatch {
            position,
            expected: expected[position].clone(),
            actual: actual[position].clone(),
        }),
        None => Ok(()),
    }
}
