//! Integration tests for the training stages and their building blocks

use ndarray::{Array1, Array2};
use std::io::Write;
use stress_lens::preprocessing::schema::feature_names;
use stress_lens::preprocessing::{EncodedTable, StandardScaler};
use stress_lens::synthetic::{class_counts, Sampler, SMOTE};
use stress_lens::training::{
    apply_threshold, macro_f1, stratified_train_test_split, ClassWeight, ParamGrid,
    RandomForest, StratifiedKFold, ThresholdScan, TrainingConfig, TrainingPipeline,
};
use stress_lens::StressError;
use tempfile::NamedTempFile;

/// 90 low / 30 high rows over 11 columns; column 4 separates the classes
fn imbalanced_table() -> EncodedTable {
    let n = 120;
    let mut data = Vec::with_capacity(n * 11);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let high = i % 4 == 1;
        for col in 0..11 {
            let value = match col {
                4 if high => 5.0 + (i % 5) as f64 * 0.1,
                4 => 7.5 + (i % 5) as f64 * 0.1,
                3 if high => 9.0 + (i % 3) as f64 * 0.2,
                3 => 4.0 + (i % 3) as f64 * 0.2,
                _ => ((i * (col + 3)) % 7) as f64,
            };
            data.push(value);
        }
        labels.push(if high { 1 } else { 0 });
    }
    EncodedTable::new(
        feature_names(),
        Array2::from_shape_vec((n, 11), data).unwrap(),
        Array1::from_vec(labels),
    )
    .unwrap()
}

fn small_pipeline() -> TrainingPipeline {
    TrainingPipeline::new(TrainingConfig::new().with_cv_folds(3).with_param_grid(ParamGrid {
        n_estimators: vec![10],
        max_depth: vec![Some(4)],
        min_samples_split: vec![2],
        min_samples_leaf: vec![1],
    }))
}

// ============================================================================
// Split and rebalance
// ============================================================================

#[test]
fn test_split_preserves_class_ratio() {
    let table = imbalanced_table();
    let split = stratified_train_test_split(table.labels(), 0.2, 42).unwrap();
    assert_eq!(split.test_indices.len(), 24);

    let high_in_test = split
        .test_indices
        .iter()
        .filter(|&&i| table.labels()[i] == 1)
        .count();
    assert_eq!(high_in_test, 6);
}

#[test]
fn test_rebalance_leaves_test_partition_alone() {
    let pipeline = small_pipeline();
    let split = pipeline.split(&imbalanced_table()).unwrap();
    let test_counts_before = class_counts(&split.y_test);

    let (_, x_train, _) = pipeline.scale(&split).unwrap();
    let balanced = pipeline.rebalance(&x_train, &split.y_train).unwrap();

    let train_counts = class_counts(&balanced.y);
    assert_eq!(train_counts[&0], train_counts[&1]);
    assert_eq!(train_counts[&0], class_counts(&split.y_train)[&0]);
    assert_eq!(class_counts(&split.y_test), test_counts_before);
}

#[test]
fn test_smote_on_scaled_data_is_deterministic() {
    let table = imbalanced_table();
    let mut scaler = StandardScaler::new();
    let x = scaler.fit_transform(table.features()).unwrap();

    let a = SMOTE::new().with_seed(9).fit_resample(&x, table.labels()).unwrap();
    let b = SMOTE::new().with_seed(9).fit_resample(&x, table.labels()).unwrap();
    assert_eq!(a.x, b.x);
    assert_eq!(a.y, b.y);
}

#[test]
fn test_scaler_round_trip() {
    let table = imbalanced_table();
    let mut scaler = StandardScaler::new();
    let scaled = scaler.fit_transform(table.features()).unwrap();
    let restored = scaler.inverse_transform(&scaled).unwrap();
    for (a, b) in restored.iter().zip(table.features().iter()) {
        assert!((a - b).abs() < 1e-9);
    }
}

// ============================================================================
// Forest, CV and threshold
// ============================================================================

#[test]
fn test_balanced_forest_separates_classes() {
    let table = imbalanced_table();
    let mut forest = RandomForest::new(20)
        .with_class_weight(ClassWeight::Balanced)
        .with_random_state(1);
    forest.fit(table.features(), table.labels()).unwrap();

    let predictions = forest.predict(table.features()).unwrap();
    assert!(macro_f1(table.labels(), &predictions) > 0.95);
}

#[test]
fn test_kfold_folds_are_disjoint() {
    let table = imbalanced_table();
    let splits = StratifiedKFold::new(5).split(table.labels()).unwrap();
    let mut seen: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..120).collect::<Vec<_>>());
}

#[test]
fn test_threshold_scan_beats_or_matches_half() {
    let pipeline = small_pipeline();
    let table = imbalanced_table();
    let split = pipeline.split(&table).unwrap();
    let (_, x_train, x_test) = pipeline.scale(&split).unwrap();
    let balanced = pipeline.rebalance(&x_train, &split.y_train).unwrap();
    let search = pipeline.search(&balanced.x, &balanced.y).unwrap();

    let (selection, probabilities) = pipeline
        .calibrate(&search.best_model, &x_test, &split.y_test)
        .unwrap();
    let at_half = macro_f1(&split.y_test, &apply_threshold(&probabilities, 0.5));
    assert!(selection.macro_f1 >= at_half);
    assert_eq!(selection.scores.len(), ThresholdScan::default().candidates().len());
}

#[test]
fn test_pipeline_rejects_single_class() {
    let table = EncodedTable::new(
        feature_names(),
        Array2::from_elem((20, 11), 1.0),
        Array1::from_elem(20, 1),
    )
    .unwrap();
    let err = small_pipeline().train(&table).unwrap_err();
    assert!(matches!(err, StressError::InsufficientClasses { .. }));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_file_drives_pipeline() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "test_size": 0.25,
            "cv_folds": 3,
            "param_grid": {{
                "n_estimators": [8],
                "max_depth": [3, null],
                "min_samples_split": [2],
                "min_samples_leaf": [1]
            }}
        }}"#
    )
    .unwrap();
    file.flush().unwrap();

    let config = TrainingConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.param_grid.len(), 2);
    let bundle = TrainingPipeline::new(config).train(&imbalanced_table()).unwrap();
    assert_eq!(bundle.candidates().len(), 2);
    assert!(bundle.accuracy() > 0.9);
}

#[test]
fn test_invalid_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{ "cv_folds": 1 }}"#).unwrap();
    file.flush().unwrap();

    let err = TrainingConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, StressError::ConfigError(_)));
}
