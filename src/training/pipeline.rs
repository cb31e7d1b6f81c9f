//! End-to-end training: split, scale, rebalance, search, calibrate, evaluate

use super::config::TrainingConfig;
use super::cross_validation::{stratified_train_test_split, StratifiedKFold};
use super::metrics::{accuracy, apply_threshold, ClassificationReport};
use super::random_forest::RandomForest;
use super::search::{CandidateScore, ForestParams, GridSearch, SearchResult};
use super::threshold::{ThresholdScore, ThresholdSelection};
use crate::error::{Result, StressError};
use crate::preprocessing::{EncodedTable, StandardScaler, StressLevel};
use crate::synthetic::{class_counts, ResampleResult, Sampler, SMOTE};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Held-out partitions produced by the stratified split
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub y_train: Array1<i64>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<i64>,
}

/// Test-partition metrics at the calibrated threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub threshold: f64,
    pub accuracy: f64,
    /// Accuracy of the same probabilities cut at 0.5
    pub default_cutoff_accuracy: f64,
    pub report: ClassificationReport,
}

/// Importance of one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub name: String,
    pub importance: f64,
}

/// Everything inference needs, fitted once and never mutated
#[derive(Debug, Clone)]
pub struct TrainedModelBundle {
    classifier: RandomForest,
    scaler: StandardScaler,
    threshold: f64,
    feature_names: Vec<String>,
    feature_importances: Vec<f64>,
    evaluation: EvaluationReport,
    best_params: ForestParams,
    cv_score: f64,
    candidates: Vec<CandidateScore>,
    threshold_scores: Vec<ThresholdScore>,
}

impl TrainedModelBundle {
    pub fn classifier(&self) -> &RandomForest {
        &self.classifier
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Importances aligned with `feature_names`
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    /// Held-out accuracy at the calibrated threshold
    pub fn accuracy(&self) -> f64 {
        self.evaluation.accuracy
    }

    pub fn evaluation(&self) -> &EvaluationReport {
        &self.evaluation
    }

    pub fn best_params(&self) -> &ForestParams {
        &self.best_params
    }

    /// Mean cross-validated macro F1 of the selected parameters
    pub fn cv_score(&self) -> f64 {
        self.cv_score
    }

    pub fn candidates(&self) -> &[CandidateScore] {
        &self.candidates
    }

    pub fn threshold_scores(&self) -> &[ThresholdScore] {
        &self.threshold_scores
    }

    /// Importances sorted from most to least influential
    pub fn ranked_importances(&self) -> Vec<FeatureImportance> {
        let mut ranked: Vec<FeatureImportance> = self
            .feature_names
            .iter()
            .zip(&self.feature_importances)
            .map(|(name, &importance)| FeatureImportance {
                name: name.clone(),
                importance,
            })
            .collect();
        ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        ranked
    }
}

/// Runs every training stage with one [`TrainingConfig`]
#[derive(Debug, Clone, Default)]
pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn train(&self, table: &EncodedTable) -> Result<TrainedModelBundle> {
        self.config.validate()?;
        if table.n_rows() == 0 {
            return Err(StressError::EmptyDataset);
        }
        let start = Instant::now();
        info!(
            rows = table.n_rows(),
            features = table.feature_names().len(),
            classes = ?table.class_counts(),
            "Training stress classifier"
        );

        let split = self.split(table)?;
        let (scaler, x_train, x_test) = self.scale(&split)?;
        let balanced = self.rebalance(&x_train, &split.y_train)?;
        let search = self.search(&balanced.x, &balanced.y)?;
        let (selection, probabilities) = self.calibrate(&search.best_model, &x_test, &split.y_test)?;
        let evaluation = evaluate(&split.y_test, &probabilities, selection.threshold);

        let feature_importances = search
            .best_model
            .feature_importances()
            .ok_or(StressError::ModelNotFitted)?
            .to_vec();
        if feature_importances.len() != table.feature_names().len() {
            return Err(StressError::ShapeError {
                expected: format!("{} importances", table.feature_names().len()),
                actual: format!("{} importances", feature_importances.len()),
            });
        }

        info!(
            threshold = evaluation.threshold,
            accuracy = evaluation.accuracy,
            macro_f1 = evaluation.report.macro_avg.f1_score,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Training complete"
        );

        Ok(TrainedModelBundle {
            classifier: search.best_model,
            scaler,
            threshold: selection.threshold,
            feature_names: table.feature_names().to_vec(),
            feature_importances,
            evaluation,
            best_params: search.best_params,
            cv_score: search.best_score,
            candidates: search.candidates,
            threshold_scores: selection.scores,
        })
    }

    /// Stratified hold-out split
    pub fn split(&self, table: &EncodedTable) -> Result<TrainTestSplit> {
        let indices = stratified_train_test_split(
            table.labels(),
            self.config.test_size,
            self.config.random_state,
        )?;
        let split = TrainTestSplit {
            x_train: table.features().select(Axis(0), &indices.train_indices),
            y_train: table.labels().select(Axis(0), &indices.train_indices),
            x_test: table.features().select(Axis(0), &indices.test_indices),
            y_test: table.labels().select(Axis(0), &indices.test_indices),
        };
        info!(
            train_rows = split.y_train.len(),
            test_rows = split.y_test.len(),
            "Split dataset"
        );
        Ok(split)
    }

    /// Fit the scaler on the train partition, apply it to both
    pub fn scale(&self, split: &TrainTestSplit) -> Result<(StandardScaler, Array2<f64>, Array2<f64>)> {
        let mut scaler = StandardScaler::new();
        let x_train = scaler.fit_transform(&split.x_train)?;
        let x_test = scaler.transform(&split.x_test)?;
        debug!(features = scaler.n_features(), "Fitted scaler on train partition");
        Ok((scaler, x_train, x_test))
    }

    /// Oversample the minority class of the (scaled) train partition
    pub fn rebalance(&self, x_train: &Array2<f64>, y_train: &Array1<i64>) -> Result<ResampleResult> {
        let mut smote = SMOTE::new()
            .with_k_neighbors(self.config.smote_k_neighbors)
            .with_seed(self.config.random_state);
        let result = smote.fit_resample(x_train, y_train)?;
        info!(
            before = ?class_counts(y_train),
            after = ?class_counts(&result.y),
            "Rebalanced train partition"
        );
        Ok(result)
    }

    /// Grid search over the configured parameters, refit on all rows
    pub fn search(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<SearchResult> {
        let search = GridSearch::new(
            self.config.param_grid.clone(),
            StratifiedKFold::new(self.config.cv_folds),
            self.config.forest_settings(),
        );
        match self.config.n_jobs {
            Some(n_jobs) => rayon::ThreadPoolBuilder::new()
                .num_threads(n_jobs)
                .build()
                .map_err(|e| StressError::ConfigError(format!("failed to build thread pool: {}", e)))?
                .install(|| search.fit(x, y)),
            None => search.fit(x, y),
        }
    }

    /// Scan thresholds on the test partition; also returns the High-class probabilities
    pub fn calibrate(
        &self,
        model: &RandomForest,
        x_test: &Array2<f64>,
        y_test: &Array1<i64>,
    ) -> Result<(ThresholdSelection, Array1<f64>)> {
        let probabilities = model.predict_class_proba(x_test, StressLevel::High.code())?;
        let selection = self.config.threshold_scan.select(y_test, &probabilities)?;
        info!(
            threshold = selection.threshold,
            macro_f1 = selection.macro_f1,
            "Calibrated decision threshold"
        );
        Ok((selection, probabilities))
    }
}

/// Score High-class probabilities against the truth at `threshold`
pub fn evaluate(y_true: &Array1<i64>, probabilities: &Array1<f64>, threshold: f64) -> EvaluationReport {
    let predictions = apply_threshold(probabilities, threshold);
    let default_predictions = apply_threshold(probabilities, 0.5);
    EvaluationReport {
        threshold,
        accuracy: accuracy(y_true, &predictions),
        default_cutoff_accuracy: accuracy(y_true, &default_predictions),
        report: ClassificationReport::compute(y_true, &predictions),
    }
}
