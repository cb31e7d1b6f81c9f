//! Training configuration

use super::random_forest::{ClassWeight, MaxFeatures};
use super::search::{ForestSettings, ParamGrid};
use super::threshold::ThresholdScan;
use crate::error::{Result, StressError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Knobs for one end-to-end training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation
    pub test_size: f64,

    /// Seed shared by the split, SMOTE and every forest
    pub random_state: u64,

    /// Folds used to score each grid candidate
    pub cv_folds: usize,

    /// Neighbours considered when synthesizing minority rows
    pub smote_k_neighbors: usize,

    pub param_grid: ParamGrid,

    pub class_weight: ClassWeight,

    pub max_features: MaxFeatures,

    pub threshold_scan: ThresholdScan,

    /// Worker threads for the search; `None` uses the global rayon pool
    pub n_jobs: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_state: 42,
            cv_folds: 5,
            smote_k_neighbors: 5,
            param_grid: ParamGrid::default(),
            class_weight: ClassWeight::Balanced,
            max_features: MaxFeatures::Sqrt,
            threshold_scan: ThresholdScan::default(),
            n_jobs: None,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_smote_k_neighbors(mut self, k: usize) -> Self {
        self.smote_k_neighbors = k;
        self
    }

    pub fn with_param_grid(mut self, grid: ParamGrid) -> Self {
        self.param_grid = grid;
        self
    }

    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_threshold_scan(mut self, scan: ThresholdScan) -> Self {
        self.threshold_scan = scan;
        self
    }

    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = Some(n_jobs);
        self
    }

    /// Forest settings shared by every grid candidate
    pub fn forest_settings(&self) -> ForestSettings {
        ForestSettings {
            class_weight: self.class_weight,
            max_features: self.max_features,
            random_state: self.random_state,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(StressError::ConfigError(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.cv_folds < 2 {
            return Err(StressError::ConfigError(format!(
                "cv_folds must be >= 2, got {}",
                self.cv_folds
            )));
        }
        if self.smote_k_neighbors == 0 {
            return Err(StressError::ConfigError(
                "smote_k_neighbors must be >= 1".to_string(),
            ));
        }
        if self.n_jobs == Some(0) {
            return Err(StressError::ConfigError("n_jobs must be >= 1".to_string()));
        }
        self.param_grid.validate()?;
        self.threshold_scan.validate()
    }

    /// Load a JSON config; missing fields fall back to defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(StressError::MissingFile(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
