//! Stratified hold-out and k-fold splitting

use crate::error::{Result, StressError};
use crate::synthetic::class_indices;
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A single train/test split
#[derive(Debug, Clone, PartialEq)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Split row indices into train/test so each class keeps its share.
///
/// Every class must have at least two rows so it can appear on both sides.
pub fn stratified_train_test_split(
    y: &Array1<i64>,
    test_size: f64,
    random_state: u64,
) -> Result<CVSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(StressError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: "must be in (0, 1)".to_string(),
        });
    }

    let by_class = class_indices(y);
    if by_class.len() < 2 || by_class.values().any(|rows| rows.len() < 2) {
        let found = by_class
            .iter()
            .map(|(class, rows)| format!("class {}: {} rows", class, rows.len()))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(StressError::InsufficientClasses { found });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(random_state);
    let mut train_indices = Vec::with_capacity(y.len());
    let mut test_indices = Vec::new();

    for mut rows in by_class.into_values() {
        rows.shuffle(&mut rng);
        let n_test = ((rows.len() as f64 * test_size).round() as usize).clamp(1, rows.len() - 1);
        test_indices.extend_from_slice(&rows[..n_test]);
        train_indices.extend_from_slice(&rows[n_test..]);
    }

    train_indices.sort_unstable();
    test_indices.sort_unstable();

    Ok(CVSplit {
        train_indices,
        test_indices,
        fold_idx: 0,
    })
}

/// Stratified K-Fold: every fold keeps roughly the overall class ratio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StratifiedKFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub random_state: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: false,
            random_state: 42,
        }
    }

    /// Shuffle rows within each class before assigning folds
    pub fn with_shuffle(mut self, random_state: u64) -> Self {
        self.shuffle = true;
        self.random_state = random_state;
        self
    }

    /// Generate train/test splits
    pub fn split(&self, y: &Array1<i64>) -> Result<Vec<CVSplit>> {
        let n_samples = y.len();
        if self.n_splits < 2 {
            return Err(StressError::InvalidParameter {
                name: "n_splits".to_string(),
                value: self.n_splits.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        if n_samples < self.n_splits {
            return Err(StressError::InvalidParameter {
                name: "n_splits".to_string(),
                value: self.n_splits.to_string(),
                reason: format!("cannot exceed the number of samples ({})", n_samples),
            });
        }

        let mut by_class = class_indices(y);
        if let Some(smallest) = by_class.values().map(Vec::len).min() {
            if smallest < self.n_splits {
                warn!(
                    smallest_class = smallest,
                    n_splits = self.n_splits,
                    "Least populated class has fewer rows than folds"
                );
            }
        }

        if self.shuffle {
            let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
            for rows in by_class.values_mut() {
                rows.shuffle(&mut rng);
            }
        }

        // Deal rows round-robin, continuing the offset across classes
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        let mut offset = 0;
        for rows in by_class.values() {
            for &row in rows {
                folds[offset % self.n_splits].push(row);
                offset += 1;
            }
        }

        let splits = (0..self.n_splits)
            .map(|fold_idx| {
                let mut test_indices = folds[fold_idx].clone();
                test_indices.sort_unstable();
                let mut train_indices: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, f)| f.iter().copied())
                    .collect();
                train_indices.sort_unstable();
                CVSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect();

        Ok(splits)
    }
}

/// Cross-validation results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Standard deviation of scores
    pub std_score: f64,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len().max(1) as f64;
        let mean_score = scores.iter().sum::<f64>() / n_folds;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds;

        Self {
            scores,
            mean_score,
            std_score: variance.sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced_labels() -> Array1<i64> {
        // 70 low, 30 high
        Array1::from_iter((0..100).map(|i| if i % 10 < 3 { 1 } else { 0 }))
    }

    fn high_fraction(y: &Array1<i64>, rows: &[usize]) -> f64 {
        rows.iter().filter(|&&i| y[i] == 1).count() as f64 / rows.len() as f64
    }

    #[test]
    fn test_train_test_split_sizes_and_ratio() {
        let y = imbalanced_labels();
        let split = stratified_train_test_split(&y, 0.2, 42).unwrap();

        assert_eq!(split.test_indices.len(), 20);
        assert_eq!(split.train_indices.len(), 80);
        assert!((high_fraction(&y, &split.train_indices) - 0.3).abs() < 0.02);
        assert!((high_fraction(&y, &split.test_indices) - 0.3).abs() < 0.02);

        let mut all: Vec<usize> = split.train_indices.clone();
        all.extend(&split.test_indices);
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_train_test_split_deterministic() {
        let y = imbalanced_labels();
        let a = stratified_train_test_split(&y, 0.2, 7).unwrap();
        let b = stratified_train_test_split(&y, 0.2, 7).unwrap();
        assert_eq!(a, b);
        let c = stratified_train_test_split(&y, 0.2, 8).unwrap();
        assert_ne!(a.test_indices, c.test_indices);
    }

    #[test]
    fn test_train_test_split_needs_two_classes() {
        let y = Array1::from_vec(vec![1, 1, 1, 1]);
        assert!(matches!(
            stratified_train_test_split(&y, 0.2, 42),
            Err(StressError::InsufficientClasses { .. })
        ));

        let y = Array1::from_vec(vec![0, 0, 0, 1]);
        assert!(stratified_train_test_split(&y, 0.2, 42).is_err());
    }

    #[test]
    fn test_train_test_split_rejects_bad_test_size() {
        let y = Array1::from_vec(vec![0, 0, 0, 1, 1, 1]);
        for bad in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            assert!(matches!(
                stratified_train_test_split(&y, bad, 0),
                Err(StressError::InvalidParameter { ref name, .. }) if name == "test_size"
            ));
        }
    }

    #[test]
    fn test_stratified_k_fold() {
        let y = Array1::from_vec(vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1]);
        let splits = StratifiedKFold::new(5).split(&y).unwrap();
        assert_eq!(splits.len(), 5);

        for split in &splits {
            assert_eq!(split.test_indices.len(), 2);
            assert_eq!(high_fraction(&y, &split.test_indices), 0.5);
            for t in &split.test_indices {
                assert!(!split.train_indices.contains(t));
            }
        }
    }

    #[test]
    fn test_stratified_k_fold_covers_all_rows() {
        let y = imbalanced_labels();
        let splits = StratifiedKFold::new(5).with_shuffle(3).split(&y).unwrap();
        let mut all_test: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        all_test.sort_unstable();
        assert_eq!(all_test, (0..100).collect::<Vec<_>>());
        for split in &splits {
            assert_eq!(split.test_indices.len(), 20);
            assert!((high_fraction(&y, &split.test_indices) - 0.3).abs() < 1e-9);
        }
    }

    #[test]
    fn test_too_many_folds() {
        let y = Array1::from_vec(vec![0, 1, 0]);
        assert!(StratifiedKFold::new(5).split(&y).is_err());
        assert!(StratifiedKFold::new(1).split(&y).is_err());
    }

    #[test]
    fn test_cv_results() {
        let results = CVResults::from_scores(vec![0.8, 0.9, 1.0]);
        assert!((results.mean_score - 0.9).abs() < 1e-12);
        assert!(results.std_score > 0.0);
    }
}
