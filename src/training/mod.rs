//! Model training
//!
//! Random forest classifier built from weighted Gini trees, stratified
//! splitting, grid search over forest parameters and decision-threshold
//! calibration, tied together by [`TrainingPipeline`].

mod config;
pub mod cross_validation;
pub mod decision_tree;
pub mod metrics;
mod pipeline;
pub mod random_forest;
pub mod search;
pub mod threshold;

pub use config::TrainingConfig;
pub use cross_validation::{stratified_train_test_split, CVResults, CVSplit, StratifiedKFold};
pub use decision_tree::{DecisionTree, TreeNode};
pub use metrics::{accuracy, apply_threshold, macro_f1, ClassMetrics, ClassificationReport};
pub use pipeline::{
    evaluate, EvaluationReport, FeatureImportance, TrainTestSplit, TrainedModelBundle,
    TrainingPipeline,
};
pub use random_forest::{ClassWeight, MaxFeatures, RandomForest};
pub use search::{CandidateScore, ForestParams, ForestSettings, GridSearch, ParamGrid, SearchResult};
pub use threshold::{ThresholdScan, ThresholdScore, ThresholdSelection};
