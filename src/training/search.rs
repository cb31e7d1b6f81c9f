//! Exhaustive hyperparameter search for the random forest

use super::cross_validation::{CVResults, StratifiedKFold};
use super::metrics::macro_f1;
use super::random_forest::{ClassWeight, MaxFeatures, RandomForest};
use crate::error::{Result, StressError};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// One point of the search grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl fmt::Display for ForestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = self
            .max_depth
            .map_or_else(|| "None".to_string(), |d| d.to_string());
        write!(
            f,
            "n_estimators={}, max_depth={}, min_samples_split={}, min_samples_leaf={}",
            self.n_estimators, depth, self.min_samples_split, self.min_samples_leaf
        )
    }
}

/// Settings shared by every forest built during a search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestSettings {
    pub class_weight: ClassWeight,
    pub max_features: MaxFeatures,
    pub random_state: u64,
}

impl ForestParams {
    /// Unfitted forest for these parameters
    pub fn forest(&self, settings: &ForestSettings) -> RandomForest {
        RandomForest::new(self.n_estimators)
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_max_features(settings.max_features)
            .with_class_weight(settings.class_weight)
            .with_random_state(settings.random_state)
    }
}

/// Value lists to cross
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<Option<usize>>,
    pub min_samples_split: Vec<usize>,
    pub min_samples_leaf: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![100, 200],
            max_depth: vec![Some(10), Some(20), None],
            min_samples_split: vec![2, 5],
            min_samples_leaf: vec![1, 2],
        }
    }
}

impl ParamGrid {
    /// All combinations; `max_depth` varies slowest, `n_estimators` fastest
    pub fn candidates(&self) -> Vec<ForestParams> {
        let mut out = Vec::with_capacity(self.len());
        for &max_depth in &self.max_depth {
            for &min_samples_leaf in &self.min_samples_leaf {
                for &min_samples_split in &self.min_samples_split {
                    for &n_estimators in &self.n_estimators {
                        out.push(ForestParams {
                            n_estimators,
                            max_depth,
                            min_samples_split,
                            min_samples_leaf,
                        });
                    }
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.n_estimators.len()
            * self.max_depth.len()
            * self.min_samples_split.len()
            * self.min_samples_leaf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(StressError::ConfigError(
                "parameter grid has no combinations".to_string(),
            ));
        }
        if self.n_estimators.contains(&0) {
            return Err(StressError::ConfigError("n_estimators must be >= 1".to_string()));
        }
        if self.max_depth.contains(&Some(0)) {
            return Err(StressError::ConfigError("max_depth must be >= 1 or None".to_string()));
        }
        if self.min_samples_split.iter().any(|&v| v < 2) {
            return Err(StressError::ConfigError("min_samples_split must be >= 2".to_string()));
        }
        if self.min_samples_leaf.contains(&0) {
            return Err(StressError::ConfigError("min_samples_leaf must be >= 1".to_string()));
        }
        Ok(())
    }
}

/// Cross-validated score of one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub params: ForestParams,
    pub cv: CVResults,
}

/// Search outcome with the winner refit on all rows
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best_index: usize,
    pub best_params: ForestParams,
    pub best_score: f64,
    pub candidates: Vec<CandidateScore>,
    pub best_model: RandomForest,
}

/// Grid search scored by macro F1 under stratified k-fold CV
#[derive(Debug, Clone)]
pub struct GridSearch {
    grid: ParamGrid,
    cv: StratifiedKFold,
    settings: ForestSettings,
}

impl GridSearch {
    pub fn new(grid: ParamGrid, cv: StratifiedKFold, settings: ForestSettings) -> Self {
        Self { grid, cv, settings }
    }

    pub fn fit(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<SearchResult> {
        self.grid.validate()?;
        if x.nrows() != y.len() {
            return Err(StressError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }

        let candidates = self.grid.candidates();
        let splits = self.cv.split(y)?;
        info!(
            candidates = candidates.len(),
            folds = splits.len(),
            fits = candidates.len() * splits.len(),
            "Starting grid search"
        );

        // Every (candidate, fold) pair trains an independent forest
        let jobs: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..splits.len()).map(move |f| (c, f)))
            .collect();

        let fold_scores: Vec<f64> = jobs
            .par_iter()
            .map(|&(c, f)| {
                let split = &splits[f];
                let x_train = x.select(Axis(0), &split.train_indices);
                let y_train = y.select(Axis(0), &split.train_indices);
                let x_test = x.select(Axis(0), &split.test_indices);
                let y_test = y.select(Axis(0), &split.test_indices);

                let mut forest = candidates[c].forest(&self.settings);
                forest.fit(&x_train, &y_train)?;
                let predictions = forest.predict(&x_test)?;
                Ok(macro_f1(&y_test, &predictions))
            })
            .collect::<Result<Vec<_>>>()?;

        let scores: Vec<CandidateScore> = candidates
            .iter()
            .zip(fold_scores.chunks(splits.len()))
            .map(|(&params, chunk)| CandidateScore {
                params,
                cv: CVResults::from_scores(chunk.to_vec()),
            })
            .collect();

        let mut best_index = 0;
        for (i, score) in scores.iter().enumerate() {
            debug!(params = %score.params, mean_f1 = score.cv.mean_score, "Candidate scored");
            if score.cv.mean_score > scores[best_index].cv.mean_score {
                best_index = i;
            }
        }

        let best_params = scores[best_index].params;
        let best_score = scores[best_index].cv.mean_score;
        info!(params = %best_params, cv_macro_f1 = best_score, "Selected hyperparameters");

        let mut best_model = best_params.forest(&self.settings);
        best_model.fit(x, y)?;

        Ok(SearchResult {
            best_index,
            best_params,
            best_score,
            candidates: scores,
            best_model,
        })
    }
}
