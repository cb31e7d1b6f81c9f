//! Decision tree classifier (weighted Gini impurity)

use crate::error::{Result, StressError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node holding the weighted class distribution
    Leaf {
        distribution: Vec<f64>,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Best split found for one node
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Decision tree classifier over class indices `0..n_classes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features drawn per split (None = all)
    pub max_features: Option<usize>,
    /// Seed for feature sub-sampling
    pub random_state: u64,
    n_features: usize,
    n_classes: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: 0,
            n_features: 0,
            n_classes: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set number of candidate features per split
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Fit with uniform sample weights
    pub fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<&mut Self> {
        let weights = vec![1.0; y.len()];
        self.fit_weighted(x, y, &weights, n_classes)
    }

    /// Fit with per-sample weights (class weighting is expressed this way)
    pub fn fit_weighted(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        sample_weight: &[f64],
        n_classes: usize,
    ) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(StressError::EmptyDataset);
        }
        if x.ncols() == 0 {
            return Err(StressError::ShapeError {
                expected: "at least 1 feature column".to_string(),
                actual: "0 feature columns".to_string(),
            });
        }
        if y.len() != n_samples || sample_weight.len() != n_samples {
            return Err(StressError::ShapeError {
                expected: format!("{} labels and weights", n_samples),
                actual: format!("{} labels, {} weights", y.len(), sample_weight.len()),
            });
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(StressError::InvalidParameter {
                name: "y".to_string(),
                value: bad.to_string(),
                reason: format!("class index must be < {}", n_classes),
            });
        }

        self.n_features = x.ncols();
        self.n_classes = n_classes;

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut importances = vec![0.0; self.n_features];
        let indices: Vec<usize> = (0..n_samples).collect();

        let builder = TreeBuilder {
            tree: self,
            x,
            y,
            w: sample_weight,
        };
        let root = builder.build(&indices, 0, &mut rng, &mut importances);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }

        self.root = Some(root);
        self.feature_importances = Some(Array1::from_vec(importances));
        Ok(self)
    }

    /// Class distribution of the leaf a sample falls into
    pub fn predict_proba_row(&self, sample: ArrayView1<f64>) -> Result<&[f64]> {
        let mut node = self.root.as_ref().ok_or(StressError::ModelNotFitted)?;
        if sample.len() != self.n_features {
            return Err(StressError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", sample.len()),
            });
        }
        loop {
            match node {
                TreeNode::Leaf { distribution, .. } => return Ok(distribution),
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if sample[*feature_idx] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Class probabilities for every row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let mut proba = Array2::zeros((x.nrows(), self.n_classes));
        for (i, row) in x.outer_iter().enumerate() {
            let dist = self.predict_proba_row(row)?;
            for (j, &p) in dist.iter().enumerate() {
                proba[[i, j]] = p;
            }
        }
        Ok(proba)
    }

    /// Most probable class index per row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        x.outer_iter()
            .map(|row| self.predict_proba_row(row).map(argmax))
            .collect()
    }

    /// Normalised impurity-decrease importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }

    pub fn get_n_leaves(&self) -> usize {
        fn leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        self.root.as_ref().map_or(0, leaves)
    }
}

/// First index of the largest value
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

fn gini(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|&c| (c / total).powi(2)).sum::<f64>()
}

/// Borrowed training state for one recursive build
struct TreeBuilder<'a> {
    tree: &'a DecisionTree,
    x: &'a Array2<f64>,
    y: &'a [usize],
    w: &'a [f64],
}

impl TreeBuilder<'_> {
    fn class_weights(&self, indices: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.tree.n_classes];
        for &i in indices {
            counts[self.y[i]] += self.w[i];
        }
        counts
    }

    fn leaf(&self, counts: Vec<f64>, total: f64, n_samples: usize) -> TreeNode {
        let distribution = if total > 0.0 {
            counts.into_iter().map(|c| c / total).collect()
        } else {
            vec![1.0 / self.tree.n_classes as f64; self.tree.n_classes]
        };
        TreeNode::Leaf {
            distribution,
            n_samples,
        }
    }

    fn build(
        &self,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = self.class_weights(indices);
        let total: f64 = counts.iter().sum();
        let impurity = gini(&counts, total);

        let should_stop = n_samples < self.tree.min_samples_split
            || n_samples < 2 * self.tree.min_samples_leaf
            || self.tree.max_depth.is_some_and(|d| depth >= d)
            || impurity <= 1e-12;

        if should_stop {
            return self.leaf(counts, total, n_samples);
        }

        let n_features = self.x.ncols();
        let n_try = self.tree.max_features.unwrap_or(n_features).clamp(1, n_features.max(1));
        let features: Vec<usize> = if n_try < n_features {
            index::sample(rng, n_features, n_try).into_vec()
        } else {
            (0..n_features).collect()
        };

        let best = match self.find_best_split(indices, &features, impurity, total) {
            Some(best) => best,
            None => return self.leaf(counts, total, n_samples),
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.x[[i, best.feature_idx]] <= best.threshold);

        importances[best.feature_idx] += total * best.gain;

        let left = Box::new(self.build(&left_idx, depth + 1, rng, importances));
        let right = Box::new(self.build(&right_idx, depth + 1, rng, importances));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
            impurity,
        }
    }

    /// Scan each candidate feature in parallel; the first feature with the
    /// largest gain wins.
    fn find_best_split(
        &self,
        indices: &[usize],
        features: &[usize],
        parent_impurity: f64,
        total: f64,
    ) -> Option<SplitCandidate> {
        let min_leaf = self.tree.min_samples_leaf;
        let n_classes = self.tree.n_classes;

        let per_feature: Vec<Option<SplitCandidate>> = features
            .par_iter()
            .map(|&feature_idx| {
                let mut order: Vec<usize> = indices.to_vec();
                order.sort_by(|&a, &b| {
                    self.x[[a, feature_idx]]
                        .partial_cmp(&self.x[[b, feature_idx]])
                        .unwrap_or(std::cmp::Ordering::Equal)
                });

                let mut left = vec![0.0; n_classes];
                let mut right = self.class_weights(indices);
                let mut left_total = 0.0;
                let mut best: Option<SplitCandidate> = None;

                for pos in 0..order.len().saturating_sub(1) {
                    let i = order[pos];
                    left[self.y[i]] += self.w[i];
                    right[self.y[i]] -= self.w[i];
                    left_total += self.w[i];

                    let here = self.x[[i, feature_idx]];
                    let next = self.x[[order[pos + 1], feature_idx]];
                    if next - here <= 1e-12 {
                        continue;
                    }
                    let n_left = pos + 1;
                    if n_left < min_leaf || order.len() - n_left < min_leaf {
                        continue;
                    }

                    let right_total = total - left_total;
                    let weighted = (left_total * gini(&left, left_total)
                        + right_total * gini(&right, right_total))
                        / total;
                    let gain = parent_impurity - weighted;

                    if gain > best.map_or(1e-12, |b| b.gain) {
                        best = Some(SplitCandidate {
                            feature_idx,
                            threshold: (here + next) / 2.0,
                            gain,
                        });
                    }
                }
                best
            })
            .collect();

        per_feature
            .into_iter()
            .flatten()
            .fold(None, |acc: Option<SplitCandidate>, c| match acc {
                Some(a) if a.gain >= c.gain => Some(a),
                _ => Some(c),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classifier_simple() {
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = [0, 0, 1, 1];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y, 2).unwrap();

        let predictions = tree.predict(&x).unwrap();
        assert_eq!(predictions.to_vec(), vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = [0, 1, 0, 1, 0, 1];

        let mut tree = DecisionTree::new().with_max_depth(Some(2));
        tree.fit(&x, &y, 2).unwrap();

        assert!(tree.get_depth() <= 3); // root split + one level + leaves
        assert!(tree.get_n_leaves() <= 4);
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = [0, 1, 1, 1];

        let mut tree = DecisionTree::new().with_min_samples_leaf(2);
        tree.fit(&x, &y, 2).unwrap();

        // A single-row left leaf would be needed for purity
        assert_eq!(tree.get_n_leaves(), 2);
        let proba = tree.predict_proba(&array![[1.0]]).unwrap();
        assert!((proba[[0, 0]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_sample_weights_shift_leaf_distribution() {
        let x = array![[1.0], [1.0], [1.0]];
        let y = [0, 0, 1];

        let mut tree = DecisionTree::new();
        tree.fit_weighted(&x, &y, &[1.0, 1.0, 2.0], 2).unwrap();

        let proba = tree.predict_proba(&x).unwrap();
        assert!((proba[[0, 0]] - 0.5).abs() < 1e-12);
        assert!((proba[[0, 1]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = [0, 0, 1, 1];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y, 2).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert!((importances[0] - 1.0).abs() < 1e-12);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_not_fitted() {
        let tree = DecisionTree::new();
        assert!(matches!(
            tree.predict(&array![[1.0]]),
            Err(StressError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_zero_width_input_rejected() {
        let x = Array2::<f64>::zeros((4, 0));
        let mut tree = DecisionTree::new();
        assert!(matches!(
            tree.fit(&x, &[0, 1, 0, 1], 2),
            Err(StressError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_argmax_first_on_tie() {
        assert_eq!(argmax(&[0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.2, 0.8]), 1);
    }
}
