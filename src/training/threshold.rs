//! Decision-threshold calibration

use super::metrics::{apply_threshold, macro_f1};
use crate::error::{Result, StressError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Candidate cutoffs `start, start + step, ..., stop` (inclusive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdScan {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
    /// Kept when no candidate reaches a positive macro F1
    pub default_threshold: f64,
}

impl Default for ThresholdScan {
    fn default() -> Self {
        Self {
            start: 0.30,
            stop: 0.65,
            step: 0.05,
            default_threshold: 0.5,
        }
    }
}

/// Macro F1 observed at one cutoff
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdScore {
    pub threshold: f64,
    pub macro_f1: f64,
}

/// Outcome of a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSelection {
    pub threshold: f64,
    pub macro_f1: f64,
    pub scores: Vec<ThresholdScore>,
}

impl ThresholdScan {
    pub fn validate(&self) -> Result<()> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !(self.step > 0.0) || !in_unit(self.start) || !in_unit(self.stop) || self.start > self.stop {
            return Err(StressError::ConfigError(format!(
                "threshold scan must satisfy 0 <= start <= stop <= 1 and step > 0, got {}..={} step {}",
                self.start, self.stop, self.step
            )));
        }
        if !in_unit(self.default_threshold) {
            return Err(StressError::ConfigError(format!(
                "default threshold must be in [0, 1], got {}",
                self.default_threshold
            )));
        }
        Ok(())
    }

    /// Candidate thresholds in ascending order
    pub fn candidates(&self) -> Vec<f64> {
        let n = ((self.stop - self.start) / self.step + 1e-9).floor() as usize + 1;
        (0..n)
            .map(|i| {
                let t = self.start + i as f64 * self.step;
                (t * 1e6).round() / 1e6
            })
            .collect()
    }

    /// Pick the cutoff with the highest macro F1. Only a strictly better score
    /// replaces the incumbent, so ties keep the lowest threshold.
    pub fn select(&self, y_true: &Array1<i64>, probabilities: &Array1<f64>) -> Result<ThresholdSelection> {
        if y_true.len() != probabilities.len() {
            return Err(StressError::ShapeError {
                expected: format!("{} probabilities", y_true.len()),
                actual: format!("{} probabilities", probabilities.len()),
            });
        }

        let scores: Vec<ThresholdScore> = self
            .candidates()
            .into_iter()
            .map(|threshold| ThresholdScore {
                threshold,
                macro_f1: macro_f1(y_true, &apply_threshold(probabilities, threshold)),
            })
            .collect();

        let mut threshold = self.default_threshold;
        let mut best_f1 = 0.0;
        for score in &scores {
            if score.macro_f1 > best_f1 {
                best_f1 = score.macro_f1;
                threshold = score.threshold;
            }
        }

        Ok(ThresholdSelection {
            threshold,
            macro_f1: best_f1,
            scores,
        })
    }
}
